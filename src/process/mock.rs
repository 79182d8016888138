//! Mock implementation of CommandRunner for testing

use super::traits::{CommandOutput, CommandRunner, CommandSpec, RunStatus};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Output(CommandOutput),
    SpawnError,
}

/// Records every command and replays scripted results.
///
/// Responses are matched against the full command line (`program args...`);
/// the most recently registered pattern contained in it wins. Unmatched
/// commands succeed with empty output.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    script: Mutex<Vec<(String, Scripted)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to commands containing `pattern` with `output`.
    pub fn respond(&self, pattern: &str, output: CommandOutput) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push((pattern.to_string(), Scripted::Output(output)));
        self
    }

    /// Reply with exit code 0 and the given stdout.
    pub fn respond_ok(&self, pattern: &str, stdout: &str) -> &Self {
        self.respond(
            pattern,
            CommandOutput {
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    /// Reply with a non-zero exit code.
    pub fn respond_exit(&self, pattern: &str, code: i32) -> &Self {
        self.respond(
            pattern,
            CommandOutput {
                code: Some(code),
                ..Default::default()
            },
        )
    }

    /// Make commands containing `pattern` fail to spawn.
    pub fn fail_spawn(&self, pattern: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push((pattern.to_string(), Scripted::SpawnError));
        self
    }

    /// Every command seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered command lines, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::command_line).collect()
    }

    /// Argument vectors of commands containing `pattern`.
    pub fn args_matching(&self, pattern: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.command_line().contains(pattern))
            .map(|spec| spec.args)
            .collect()
    }

    fn lookup(&self, spec: &CommandSpec) -> Option<Scripted> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.command_line();
        self.script
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, scripted)| scripted.clone())
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn capture(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        match self.lookup(spec) {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::SpawnError) => Err(anyhow!(
                "Failed to execute `{}`: mock spawn failure",
                spec.command_line()
            )),
            None => Ok(CommandOutput {
                code: Some(0),
                ..Default::default()
            }),
        }
    }

    async fn stream(&self, spec: &CommandSpec) -> RunStatus {
        match self.lookup(spec) {
            Some(Scripted::Output(output)) => RunStatus {
                success: output.success(),
                code: output.code,
            },
            Some(Scripted::SpawnError) => RunStatus::failed(),
            None => RunStatus {
                success: true,
                code: Some(0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_commands_succeed_and_are_recorded() {
        let mock = MockCommandRunner::new();
        let spec = CommandSpec::new("npx", ["supabase", "stop"]);
        assert!(mock.stream(&spec).await.success);
        assert_eq!(mock.command_lines(), vec!["npx supabase stop"]);
    }

    #[tokio::test]
    async fn test_latest_matching_pattern_wins() {
        let mock = MockCommandRunner::new();
        mock.respond_ok("supabase", "first").respond_ok("supabase status", "second");

        let status = CommandSpec::new("npx", ["supabase", "status"]);
        let out = mock.capture(&status).await.unwrap();
        assert_eq!(out.stdout, "second");

        let version = CommandSpec::new("npx", ["supabase", "--version"]);
        assert_eq!(mock.capture(&version).await.unwrap().stdout, "first");
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let mock = MockCommandRunner::new();
        mock.fail_spawn("docker");
        let spec = CommandSpec::new("docker", ["info"]);
        assert!(mock.capture(&spec).await.is_err());
        assert_eq!(mock.stream(&spec).await, RunStatus::failed());
    }
}
