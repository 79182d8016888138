use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct DbPushOptions {
    #[arg(long)]
    pub supabase_directory: String,

    /// Print the statements without applying them
    #[arg(long)]
    #[serde(default)]
    pub dry_run: bool,

    /// Remote project ref
    #[arg(long)]
    #[serde(default)]
    pub linked_project: Option<String>,

    /// Database password, exported as `SUPABASE_DB_PASSWORD`
    #[arg(long, env = "SUPABASE_DB_PASSWORD", hide_env_values = true)]
    #[serde(default)]
    pub password: Option<String>,

    #[arg(long)]
    #[serde(default)]
    pub include_seed: bool,
}

pub fn db_push_args(options: &DbPushOptions) -> Vec<String> {
    let mut args = vec!["db".to_string(), "push".to_string()];
    if options.dry_run {
        args.push("--dry-run".to_string());
    }
    if let Some(project_ref) = &options.linked_project {
        args.push(format!("--project-ref={}", project_ref));
    }
    if options.include_seed {
        args.push("--include-seed".to_string());
    }
    args
}

/// Push local migrations to the linked remote database.
pub async fn db_push(options: &DbPushOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    let mut env = match ctx.load_env(&workdir) {
        Ok(env) => env,
        Err(e) => {
            error!("Failed to push database: {:#}", e);
            return ExecutorResult::failed();
        }
    };
    if let Some(password) = &options.password {
        env.insert("SUPABASE_DB_PASSWORD".to_string(), password.clone());
    }

    info!("Pushing database changes to remote...");
    let result = ctx
        .supabase
        .run_streaming(&db_push_args(options), &workdir, &env)
        .await;
    if result.success {
        info!("Database push completed successfully!");
    } else {
        error!(code = ?result.code, "Failed to push database");
    }
    ExecutorResult::from_success(result.success)
}
