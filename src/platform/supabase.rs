//! Supabase CLI wrapper.

use super::status::{parse_status_output, SupabaseStatus};
use crate::process::{split_command, CommandOutput, CommandRunner, CommandSpec, RunStatus};
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Invokes the Supabase CLI (`npx supabase` unless configured otherwise).
#[derive(Clone)]
pub struct SupabaseCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    prefix: Vec<String>,
    status_timeout: Duration,
}

impl SupabaseCli {
    /// # Errors
    ///
    /// `command` is blank.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        command: &str,
        status_timeout: Duration,
    ) -> Result<Self> {
        let Some((program, prefix)) = split_command(command) else {
            bail!("Supabase CLI command must not be empty");
        };
        Ok(Self {
            runner,
            program,
            prefix,
            status_timeout,
        })
    }

    fn spec(&self, args: &[String], cwd: Option<&Path>, env: &BTreeMap<String, String>) -> CommandSpec {
        let mut spec = CommandSpec::new(
            self.program.clone(),
            self.prefix.iter().chain(args.iter()).cloned(),
        )
        .envs(env.clone());
        if let Some(cwd) = cwd {
            spec = spec.cwd(cwd);
        }
        spec
    }

    /// Trimmed `--version` output, or `None` when the CLI cannot be run.
    pub async fn version(&self) -> Option<String> {
        let spec = self.spec(&["--version".to_string()], None, &BTreeMap::new());
        match self.runner.capture(&spec).await {
            Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
            Ok(output) => {
                debug!(code = ?output.code, "Supabase CLI version check failed");
                None
            }
            Err(e) => {
                debug!(error = %e, "Supabase CLI not available");
                None
            }
        }
    }

    pub async fn is_installed(&self) -> bool {
        self.version().await.is_some()
    }

    /// Run a command and capture its output.
    pub async fn run(
        &self,
        args: &[String],
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<CommandOutput> {
        let spec = self.spec(args, Some(cwd), env);
        info!("Running: {}", spec.command_line());
        self.runner.capture(&spec).await
    }

    /// Run a command with output going straight to the terminal.
    pub async fn run_streaming(
        &self,
        args: &[String],
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> RunStatus {
        let spec = self.spec(args, Some(cwd), env);
        debug!(command = %spec.command_line(), cwd = %cwd.display(), "Streaming command");
        self.runner.stream(&spec).await
    }

    fn status_spec(&self, cwd: &Path) -> CommandSpec {
        self.spec(&["status".to_string()], Some(cwd), &BTreeMap::new())
            .timeout(self.status_timeout)
    }

    async fn status_stdout(&self, cwd: &Path) -> Option<String> {
        match self.runner.capture(&self.status_spec(cwd)).await {
            Ok(output) if output.success() => Some(output.stdout),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "supabase status failed");
                None
            }
        }
    }

    /// Parsed `supabase status` for the stack rooted at `cwd`; `None` when
    /// the command fails or reports nothing.
    pub async fn status(&self, cwd: &Path) -> Option<SupabaseStatus> {
        parse_status_output(&self.status_stdout(cwd).await?)
    }

    /// True when `supabase status` succeeds and reports an API URL.
    pub async fn is_running(&self, cwd: &Path) -> bool {
        self.status_stdout(cwd)
            .await
            .is_some_and(|stdout| stdout.contains("API URL:"))
    }
}
