use super::{log_status, ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Supabase directory, relative to the workspace root
    #[arg(long)]
    pub supabase_directory: String,

    /// Paths whose health checks should be skipped
    #[arg(long = "ignore-path")]
    #[serde(default)]
    pub ignore_paths: Vec<String>,

    /// Services to leave out (repeatable)
    #[arg(long = "exclude")]
    #[serde(default)]
    pub exclude_services: Vec<String>,

    #[arg(long)]
    #[serde(default)]
    pub debug: bool,
}

/// Arguments for `supabase start`.
///
/// The CLI only knows a global `--ignore-health-check` switch, so it is
/// passed once whenever any ignore path is configured.
pub fn start_args(options: &StartOptions) -> Vec<String> {
    let mut args = vec!["start".to_string()];
    if !options.ignore_paths.is_empty() {
        args.push("--ignore-health-check".to_string());
    }
    args.extend(
        options
            .exclude_services
            .iter()
            .map(|service| format!("--exclude={}", service)),
    );
    if options.debug {
        args.push("--debug".to_string());
    }
    args
}

pub async fn start(options: &StartOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);

    if !ctx.docker.is_running().await {
        error!("Docker is not running. Please start Docker Desktop.");
        return ExecutorResult::failed();
    }

    if let Some(status) = ctx.supabase.status(&workdir).await {
        info!("Supabase is already running!");
        log_status(&status, str::to_string);
        return ExecutorResult::ok();
    }

    info!("Starting Supabase in {}...", workdir.display());
    let result = ctx
        .supabase
        .run_streaming(&start_args(options), &workdir, &BTreeMap::new())
        .await;

    if result.success {
        info!("Supabase started successfully!");
        if let Some(status) = ctx.supabase.status(&workdir).await {
            log_status(&status, str::to_string);
        }
    } else {
        error!(code = ?result.code, "Failed to start Supabase");
    }
    ExecutorResult::from_success(result.success)
}
