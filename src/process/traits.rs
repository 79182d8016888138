//! Trait abstraction for running external commands

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Description of one subprocess invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits ours when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment on top of the inherited one.
    pub env: BTreeMap<String, String>,
    /// Only honoured by [`CommandRunner::capture`].
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Result of a command whose output went straight to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl RunStatus {
    pub fn failed() -> Self {
        Self {
            success: false,
            code: None,
        }
    }
}

/// Runs subprocesses.
///
/// # Implementations
///
/// - [`ProcessRunner`](super::ProcessRunner): spawns real processes via tokio
/// - [`MockCommandRunner`](super::MockCommandRunner): records calls, replays scripted output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture stdout/stderr.
    ///
    /// # Errors
    ///
    /// Spawn failures and timeouts. A non-zero exit is *not* an error; check
    /// [`CommandOutput::success`].
    async fn capture(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run with inherited stdio and wait for exit. Spawn failures are
    /// reported as an unsuccessful status.
    async fn stream(&self, spec: &CommandSpec) -> RunStatus;
}
