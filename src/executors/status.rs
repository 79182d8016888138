use super::{log_status, ExecutorContext, ExecutorResult};
use crate::platform::format_status_key;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct StatusOptions {
    #[arg(long)]
    pub supabase_directory: String,
}

/// Report the stack's status. Never fails: a stopped stack or a missing
/// Docker daemon are reported, not treated as errors.
pub async fn status(options: &StatusOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);

    if !ctx.docker.is_running().await {
        warn!("Docker is not running.");
        return ExecutorResult::ok();
    }

    match ctx.supabase.status(&workdir).await {
        Some(status) => {
            info!("Supabase Status:");
            log_status(&status, format_status_key);
        }
        None => {
            info!("Supabase is not running.");
            info!("Run 'nxsupabase run {}:supabase-start' to start.", ctx.project_name);
        }
    }
    ExecutorResult::ok()
}
