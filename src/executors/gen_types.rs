//! TypeScript type generation.
//!
//! Runs `supabase gen types typescript` and writes its stdout to
//! `outputPath`. The local source needs a running stack; `linked` reads
//! the linked remote project and `db-url` an arbitrary connection string.

use super::{resolve_path, ExecutorContext, ExecutorResult};
use crate::tree::fs::write_atomic;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TypesSource {
    #[default]
    Local,
    Linked,
    DbUrl,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
#[serde(rename_all = "camelCase")]
pub struct GenTypesOptions {
    #[arg(long)]
    pub supabase_directory: String,

    /// Output file, relative to the workspace root
    #[arg(long)]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "local")]
    #[serde(default)]
    pub source: TypesSource,

    /// Connection string, required with `--source db-url`
    #[arg(long)]
    #[serde(default)]
    pub db_url: Option<String>,

    /// Schemas to include (default: the CLI's default, `public`)
    #[arg(long = "schema")]
    #[serde(default)]
    pub schemas: Vec<String>,
}

/// Arguments for `supabase gen types typescript`.
///
/// # Errors
///
/// `db-url` source without a `dbUrl`.
pub fn gen_types_args(options: &GenTypesOptions) -> Result<Vec<String>> {
    let mut args: Vec<String> = ["gen", "types", "typescript"]
        .into_iter()
        .map(String::from)
        .collect();
    match options.source {
        TypesSource::Local => args.push("--local".to_string()),
        TypesSource::Linked => args.push("--linked".to_string()),
        TypesSource::DbUrl => {
            let Some(url) = options.db_url.as_deref().filter(|u| !u.is_empty()) else {
                bail!("source 'db-url' requires dbUrl");
            };
            args.push(format!("--db-url={}", url));
        }
    }
    if !options.schemas.is_empty() {
        args.push(format!("--schema={}", options.schemas.join(",")));
    }
    Ok(args)
}

fn write_types(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_atomic(path, content.as_bytes())
}

async fn generate(options: &GenTypesOptions, ctx: &ExecutorContext) -> Result<bool> {
    let workdir = ctx.resolve_supabase_path(&options.supabase_directory);
    let args = gen_types_args(options)?;

    if options.source == TypesSource::Local && !ctx.supabase.is_running(&workdir).await {
        ctx.log_not_running();
        return Ok(false);
    }

    let env = ctx.load_env(&workdir)?;
    info!("Generating TypeScript types...");
    let output = ctx.supabase.run(&args, &workdir, &env).await?;
    if !output.success() {
        error!(code = ?output.code, "{}", output.stderr.trim());
        return Ok(false);
    }

    let target = resolve_path(&ctx.workspace_root, &options.output_path);
    write_types(&target, &output.stdout)?;
    info!("Types written to {}", target.display());
    Ok(true)
}

pub async fn gen_types(options: &GenTypesOptions, ctx: &ExecutorContext) -> ExecutorResult {
    match generate(options, ctx).await {
        Ok(success) => ExecutorResult::from_success(success),
        Err(e) => {
            error!("Failed to generate types: {:#}", e);
            ExecutorResult::failed()
        }
    }
}
