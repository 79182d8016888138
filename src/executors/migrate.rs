use super::{ExecutorContext, ExecutorResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MigrateTarget {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct MigrateOptions {
    #[arg(long)]
    pub supabase_directory: String,

    /// Database to migrate
    #[arg(long, value_enum, default_value_t)]
    #[serde(default)]
    pub target: MigrateTarget,
}

pub fn migrate_args(options: &MigrateOptions) -> Vec<String> {
    let mut args = vec!["migration".to_string(), "up".to_string()];
    if options.target == MigrateTarget::Remote {
        args.push("--linked".to_string());
    }
    args
}

/// Apply pending migrations. The local target needs a running stack.
pub async fn migrate(options: &MigrateOptions, ctx: &ExecutorContext) -> ExecutorResult {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    let env = match ctx.load_env(&workdir) {
        Ok(env) => env,
        Err(e) => {
            error!("Failed to run migrations: {:#}", e);
            return ExecutorResult::failed();
        }
    };

    let remote = options.target == MigrateTarget::Remote;
    if !remote && !ctx.supabase.is_running(&workdir).await {
        ctx.log_not_running();
        return ExecutorResult::failed();
    }

    info!(
        "Running migrations on {} database...",
        if remote { "remote" } else { "local" }
    );
    let result = ctx
        .supabase
        .run_streaming(&migrate_args(options), &workdir, &env)
        .await;
    if result.success {
        info!("Migrations applied successfully!");
    } else {
        error!(code = ?result.code, "Failed to run migrations");
    }
    ExecutorResult::from_success(result.success)
}

impl std::fmt::Display for MigrateTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MigrateTarget::Local => "local",
            MigrateTarget::Remote => "remote",
        })
    }
}
