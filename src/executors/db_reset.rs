use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct DbResetOptions {
    #[arg(long)]
    pub supabase_directory: String,

    #[arg(long)]
    #[serde(default)]
    pub debug: bool,
}

pub fn db_reset_args(options: &DbResetOptions) -> Vec<String> {
    let mut args = vec!["db".to_string(), "reset".to_string()];
    if options.debug {
        args.push("--debug".to_string());
    }
    args
}

/// Drop the local database, re-apply migrations and load seed data.
/// Requires Docker and a running stack.
pub async fn db_reset(options: &DbResetOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);

    if !ctx.docker.is_running().await {
        error!("Docker is not running. Please start Docker Desktop.");
        return ExecutorResult::failed();
    }
    if !ctx.supabase.is_running(&workdir).await {
        ctx.log_not_running();
        return ExecutorResult::failed();
    }

    warn!("This will delete all data in your local database!");
    info!("Resetting database...");

    let result = ctx
        .supabase
        .run_streaming(&db_reset_args(options), &workdir, &BTreeMap::new())
        .await;
    if result.success {
        info!("Database reset completed! Migrations re-applied and seed data loaded.");
    } else {
        error!(code = ?result.code, "Failed to reset database");
    }
    ExecutorResult::from_success(result.success)
}
