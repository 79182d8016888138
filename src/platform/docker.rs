//! Container runtime probe.

use crate::process::{split_command, CommandRunner, CommandSpec};
use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Asks the Docker CLI whether the daemon is reachable.
#[derive(Clone)]
pub struct Docker {
    runner: Arc<dyn CommandRunner>,
    program: String,
    prefix: Vec<String>,
    info_timeout: Duration,
}

impl Docker {
    pub fn new(runner: Arc<dyn CommandRunner>, command: &str, info_timeout: Duration) -> Result<Self> {
        let Some((program, prefix)) = split_command(command) else {
            bail!("Docker command must not be empty");
        };
        Ok(Self {
            runner,
            program,
            prefix,
            info_timeout,
        })
    }

    fn spec(&self, arg: &str) -> CommandSpec {
        CommandSpec::new(
            self.program.clone(),
            self.prefix.iter().cloned().chain(std::iter::once(arg.to_string())),
        )
    }

    /// `docker info` exits zero within the timeout.
    pub async fn is_running(&self) -> bool {
        let spec = self.spec("info").timeout(self.info_timeout);
        match self.runner.capture(&spec).await {
            Ok(output) => output.success(),
            Err(e) => {
                debug!(error = %e, "docker info failed");
                false
            }
        }
    }

    pub async fn version(&self) -> Option<String> {
        let output = self.runner.capture(&self.spec("--version")).await.ok()?;
        output.success().then(|| output.stdout.trim().to_string())
    }
}
