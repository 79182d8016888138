use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct StopOptions {
    #[arg(long)]
    pub supabase_directory: String,

    /// Discard local data instead of backing it up
    #[arg(long)]
    #[serde(default)]
    pub no_backup: bool,
}

pub fn stop_args(options: &StopOptions) -> Vec<String> {
    let mut args = vec!["stop".to_string()];
    if options.no_backup {
        args.push("--no-backup".to_string());
    }
    args
}

pub async fn stop(options: &StopOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    info!("Stopping Supabase in {}...", workdir.display());

    let result = ctx
        .supabase
        .run_streaming(&stop_args(options), &workdir, &BTreeMap::new())
        .await;
    if result.success {
        info!("Supabase stopped successfully!");
    } else {
        error!(code = ?result.code, "Failed to stop Supabase");
    }
    ExecutorResult::from_success(result.success)
}
