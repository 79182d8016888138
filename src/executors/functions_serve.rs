use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct FunctionsServeOptions {
    #[arg(long)]
    pub supabase_directory: String,

    /// Serve only these functions
    #[arg(long = "function")]
    #[serde(default)]
    pub functions: Vec<String>,

    #[arg(long)]
    #[serde(default)]
    pub no_verify_jwt: bool,

    #[arg(long)]
    #[serde(default)]
    pub env_file: Option<String>,

    #[arg(long)]
    #[serde(default)]
    pub debug: bool,
}

pub fn functions_serve_args(options: &FunctionsServeOptions) -> Vec<String> {
    let mut args = vec!["functions".to_string(), "serve".to_string()];
    if options.no_verify_jwt {
        args.push("--no-verify-jwt".to_string());
    }
    if let Some(env_file) = &options.env_file {
        args.push(format!("--env-file={}", env_file));
    }
    if options.debug {
        args.push("--debug".to_string());
    }
    args.extend(options.functions.iter().cloned());
    args
}

/// Serve edge functions locally until interrupted.
pub async fn functions_serve(
    options: &FunctionsServeOptions,
    ctx: &ExecutorContext,
) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    let env = match ctx.load_env(&workdir) {
        Ok(env) => env,
        Err(e) => {
            error!("Failed to serve functions: {:#}", e);
            return ExecutorResult::failed();
        }
    };

    if !ctx.supabase.is_running(&workdir).await {
        ctx.log_not_running();
        return ExecutorResult::failed();
    }

    info!("Starting Edge Functions development server...");
    let result = ctx
        .supabase
        .run_streaming(&functions_serve_args(options), &workdir, &env)
        .await;
    ExecutorResult::from_success(result.success)
}
