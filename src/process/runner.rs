//! Subprocess runner backed by `tokio::process`.

use super::traits::{CommandOutput, CommandRunner, CommandSpec, RunStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).envs(&spec.env).kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn capture(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec.command_line(), "Running command");

        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .with_context(|| {
                    format!("`{}` timed out after {:?}", spec.command_line(), limit)
                })?,
            None => cmd.output().await,
        }
        .with_context(|| format!("Failed to execute `{}`", spec.command_line()))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn stream(&self, spec: &CommandSpec) -> RunStatus {
        let mut cmd = Self::command(spec);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %spec.command_line(), error = %e, "Failed to spawn command");
                return RunStatus::failed();
            }
        };

        match child.wait().await {
            Ok(status) => RunStatus {
                success: status.success(),
                code: status.code(),
            },
            Err(e) => {
                warn!(command = %spec.command_line(), error = %e, "Failed to wait for command");
                RunStatus::failed()
            }
        }
    }
}
