//! Remote deployment: migrations first, then edge functions.

use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    #[arg(long)]
    pub supabase_directory: String,

    #[arg(long)]
    #[serde(default)]
    pub project_ref: Option<String>,

    /// Functions to deploy (default: every function directory)
    #[arg(long = "function")]
    #[serde(default)]
    pub functions: Vec<String>,

    /// Set to false to skip function deployment
    #[arg(long)]
    #[serde(default)]
    pub deploy_functions: Option<bool>,

    /// Set to false to skip `db push`
    #[arg(long)]
    #[serde(default)]
    pub push_migrations: Option<bool>,

    #[arg(long)]
    #[serde(default)]
    pub no_verify_jwt: bool,
}

/// Function directories under `functions_dir`, skipping `_`-prefixed ones
/// such as `_shared`. Sorted; empty when the directory is missing.
pub fn discover_functions(functions_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(functions_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('_'))
        .collect();
    names.sort();
    names
}

fn project_ref_flag(options: &DeployOptions) -> Option<String> {
    options
        .project_ref
        .as_ref()
        .map(|r| format!("--project-ref={}", r))
}

async fn run(ctx: &ExecutorContext, args: Vec<String>, workdir: &Path, env: &BTreeMap<String, String>) -> bool {
    ctx.supabase.run_streaming(&args, workdir, env).await.success
}

pub async fn deploy(options: &DeployOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    let env = match ctx.load_env(&workdir) {
        Ok(env) => env,
        Err(e) => {
            error!("Deployment failed: {:#}", e);
            return ExecutorResult::failed();
        }
    };
    let project_ref = project_ref_flag(options);

    if options.push_migrations != Some(false) {
        info!("Pushing migrations to remote...");
        let mut args = vec!["db".to_string(), "push".to_string()];
        args.extend(project_ref.clone());
        if !run(ctx, args, &workdir, &env).await {
            error!("Failed to push migrations");
            return ExecutorResult::failed();
        }
        info!("Migrations pushed successfully!");
    }

    if options.deploy_functions != Some(false) {
        info!("Deploying Edge Functions...");
        let functions = if options.functions.is_empty() {
            discover_functions(&workdir.join("functions"))
        } else {
            options.functions.clone()
        };

        if functions.is_empty() {
            warn!("No functions to deploy.");
        }
        for function in &functions {
            info!("Deploying function: {}...", function);
            let mut args = vec![
                "functions".to_string(),
                "deploy".to_string(),
                function.clone(),
            ];
            args.extend(project_ref.clone());
            if options.no_verify_jwt {
                args.push("--no-verify-jwt".to_string());
            }
            if !run(ctx, args, &workdir, &env).await {
                error!("Failed to deploy function: {}", function);
                return ExecutorResult::failed();
            }
            info!("Function '{}' deployed!", function);
        }
    }

    info!("Deployment completed successfully!");
    ExecutorResult::ok()
}
