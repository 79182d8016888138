//! External command execution
//!
//! Everything that talks to the Supabase CLI or the container runtime goes
//! through a [`CommandRunner`], so executors can be exercised against a
//! recording mock.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `CommandRunner` trait: captured or streamed execution
//! - `ProcessRunner`: real implementation on `tokio::process`
//! - `MockCommandRunner`: scripted results, call recording

pub mod mock;
pub mod runner;
pub mod traits;

pub use mock::MockCommandRunner;
pub use runner::ProcessRunner;
pub use traits::{CommandOutput, CommandRunner, CommandSpec, RunStatus};

/// Split a configured command such as `npx supabase` into program and
/// leading arguments. Empty input yields `None`.
pub fn split_command(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}
