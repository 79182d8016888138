use super::names::snake_file_name;
use super::{ensure_dir, supabase_dir, templates};
use crate::tree::{join_path, Tree};
use crate::workspace::read_project;
use anyhow::{bail, Result};
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use std::fmt::Display;
use tracing::info;

#[derive(Debug, Clone, Default, clap::Args)]
pub struct MigrationOptions {
    /// Migration name, e.g. "create users table"
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub project: String,

    #[arg(long)]
    pub directory: Option<String>,

    /// SQL body (default: a commented template)
    #[arg(long)]
    pub sql: Option<String>,
}

/// Create a timestamped migration file. Returns its workspace-relative path.
pub fn migration(tree: &mut dyn Tree, options: &MigrationOptions) -> Result<String> {
    migration_at(tree, options, Local::now())
}

/// [`migration`] with an explicit clock. The file name uses `now` in its own
/// time zone; the template's creation stamp is UTC.
pub fn migration_at<Tz>(
    tree: &mut dyn Tree,
    options: &MigrationOptions,
    now: DateTime<Tz>,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if options.name.trim().is_empty() {
        bail!("Migration name must not be empty");
    }
    let migration_name = snake_file_name(options.name.trim());

    let project = read_project(tree, &options.project)?;
    let migrations_dir = join_path(&[
        &project.root,
        supabase_dir(options.directory.as_deref()),
        "migrations",
    ]);
    ensure_dir(tree, &migrations_dir);

    let file = format!("{}_{}.sql", now.format("%Y%m%d%H%M%S"), migration_name);
    let path = join_path(&[&migrations_dir, &file]);

    let content = match &options.sql {
        Some(sql) => sql.clone(),
        None => templates::migration_sql(
            &migration_name,
            &now.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    };
    tree.write_str(&path, &content);

    info!("Migration created: {}", path);
    info!("Next steps:");
    info!("  1. Edit the migration file to add your SQL");
    info!("  2. Run 'nxsupabase run {}:supabase-db-reset' to apply locally", options.project);
    info!("  3. Run 'nxsupabase run {}:supabase-gen-types' to update types", options.project);
    Ok(path)
}
