//! Lifecycle executors
//!
//! Each executor turns its options into one or more Supabase CLI calls. The
//! CLI's own failures are logged and reported as `success: false`; they are
//! never propagated as errors. Only unknown executor names and malformed
//! options are errors (see [`run_executor`]).
//!
//! Options use camelCase field names so they read straight out of a
//! `project.json` target.

pub mod db_push;
pub mod db_reset;
pub mod deploy;
pub mod functions_serve;
pub mod gen_types;
pub mod migrate;
pub mod start;
pub mod status;
pub mod stop;

pub use db_push::DbPushOptions;
pub use db_reset::DbResetOptions;
pub use deploy::DeployOptions;
pub use functions_serve::FunctionsServeOptions;
pub use gen_types::{GenTypesOptions, TypesSource};
pub use migrate::{MigrateOptions, MigrateTarget};
pub use start::StartOptions;
pub use status::StatusOptions;
pub use stop::StopOptions;

use crate::platform::{Docker, SupabaseCli, SupabaseStatus};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info};

/// Package prefix of executor strings in `project.json`.
pub const EXECUTOR_PACKAGE: &str = "@nxsupabase/supabase";

/// Outcome reported back to the build graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutorResult {
    pub success: bool,
}

impl ExecutorResult {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn failed() -> Self {
        Self { success: false }
    }

    pub fn from_success(success: bool) -> Self {
        Self { success }
    }
}

/// Everything an executor needs besides its options.
#[derive(Clone)]
pub struct ExecutorContext {
    pub workspace_root: PathBuf,
    pub project_name: String,
    pub supabase: SupabaseCli,
    pub docker: Docker,
}

impl ExecutorContext {
    /// Absolute paths are kept; relative ones are joined to the workspace root.
    pub fn resolve_supabase_path(&self, supabase_directory: &str) -> PathBuf {
        resolve_path(&self.workspace_root, supabase_directory)
    }

    /// Merged `.env` layers for the stack in `supabase_dir`.
    pub fn load_env(&self, supabase_dir: &Path) -> Result<BTreeMap<String, String>> {
        crate::env::load_env_layers(&self.workspace_root, supabase_dir)
    }

    /// Log the usual "start it first" hint.
    pub(crate) fn log_not_running(&self) {
        error!("Supabase is not running. Start it first with:");
        error!("  nxsupabase run {}:supabase-start", self.project_name);
    }
}

pub(crate) fn resolve_path(workspace_root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

pub(crate) fn log_status(status: &SupabaseStatus, format_key: fn(&str) -> String) {
    for (key, value) in status.iter() {
        info!("  {}: {}", format_key(key), value);
    }
}

/// The executors this plugin provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorKind {
    Start,
    Stop,
    Status,
    DbReset,
    Migrate,
    DbPush,
    Deploy,
    FunctionsServe,
    GenTypes,
}

impl ExecutorKind {
    pub const ALL: [ExecutorKind; 9] = [
        ExecutorKind::Start,
        ExecutorKind::Stop,
        ExecutorKind::Status,
        ExecutorKind::DbReset,
        ExecutorKind::Migrate,
        ExecutorKind::DbPush,
        ExecutorKind::Deploy,
        ExecutorKind::FunctionsServe,
        ExecutorKind::GenTypes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExecutorKind::Start => "start",
            ExecutorKind::Stop => "stop",
            ExecutorKind::Status => "status",
            ExecutorKind::DbReset => "db-reset",
            ExecutorKind::Migrate => "migrate",
            ExecutorKind::DbPush => "db-push",
            ExecutorKind::Deploy => "deploy",
            ExecutorKind::FunctionsServe => "functions-serve",
            ExecutorKind::GenTypes => "gen-types",
        }
    }

    /// Executor string as written in `project.json`.
    pub fn qualified(self) -> String {
        format!("{}:{}", EXECUTOR_PACKAGE, self.name())
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExecutorKind {
    type Err = anyhow::Error;

    /// Accepts both `db-push` and `@nxsupabase/supabase:db-push`.
    fn from_str(s: &str) -> Result<Self> {
        let name = match s.split_once(':') {
            Some((package, name)) if package == EXECUTOR_PACKAGE => name,
            Some(_) => anyhow::bail!("Executor '{}' does not belong to {}", s, EXECUTOR_PACKAGE),
            None => s,
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .with_context(|| format!("Unknown executor '{}'", s))
    }
}

fn parse_options<T: DeserializeOwned>(kind: ExecutorKind, options: Value) -> Result<T> {
    serde_json::from_value(options)
        .with_context(|| format!("Invalid options for executor '{}'", kind))
}

/// Run an executor by kind with options taken from a target configuration.
///
/// # Errors
///
/// `options` does not deserialize into the executor's option type.
pub async fn run_executor(
    kind: ExecutorKind,
    options: Value,
    ctx: &ExecutorContext,
) -> Result<ExecutorResult> {
    info!(executor = %kind, project = %ctx.project_name, "Running executor");
    let result = match kind {
        ExecutorKind::Start => start::start(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::Stop => stop::stop(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::Status => status::status(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::DbReset => db_reset::db_reset(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::Migrate => migrate::migrate(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::DbPush => db_push::db_push(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::Deploy => deploy::deploy(&parse_options(kind, options)?, ctx).await,
        ExecutorKind::FunctionsServe => {
            functions_serve::functions_serve(&parse_options(kind, options)?, ctx).await
        }
        ExecutorKind::GenTypes => gen_types::gen_types(&parse_options(kind, options)?, ctx).await,
    };
    Ok(result)
}
