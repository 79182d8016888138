use super::{supabase_dir, templates};
use crate::tree::{join_path, Tree};
use crate::workspace::read_project;
use anyhow::Result;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, clap::Args)]
pub struct SeedOptions {
    #[arg(long)]
    pub project: String,

    /// File name without `.sql` (default: seed)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub directory: Option<String>,
}

/// Create a seed file. An existing file is left untouched and `None` is
/// returned.
pub fn seed(tree: &mut dyn Tree, options: &SeedOptions) -> Result<Option<String>> {
    let project = read_project(tree, &options.project)?;
    let file = format!(
        "{}.sql",
        options.name.as_deref().filter(|n| !n.is_empty()).unwrap_or("seed")
    );
    let path = join_path(&[&project.root, supabase_dir(options.directory.as_deref()), &file]);

    if tree.exists(&path) {
        warn!("Seed file already exists at {}", path);
        info!("Edit the existing file to add more seed data.");
        return Ok(None);
    }

    tree.write_str(&path, templates::SEED_SQL);
    info!("Seed file created: {}", path);
    info!(
        "It runs on 'nxsupabase run {}:supabase-db-reset' and on 'supabase db reset'.",
        options.project
    );
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::workspace_with_project;

    #[test]
    fn test_seed_created_once() {
        let (_tmp, mut tree) = workspace_with_project("web", "apps/web");
        let options = SeedOptions {
            project: "web".into(),
            ..Default::default()
        };

        let path = seed(&mut tree, &options).unwrap();
        assert_eq!(path.as_deref(), Some("apps/web/supabase/seed.sql"));

        tree.write_str("apps/web/supabase/seed.sql", "-- mine");
        assert_eq!(seed(&mut tree, &options).unwrap(), None);
        assert_eq!(
            tree.read_to_string("apps/web/supabase/seed.sql").unwrap().as_deref(),
            Some("-- mine")
        );
    }

    #[test]
    fn test_named_seed() {
        let (_tmp, mut tree) = workspace_with_project("web", "apps/web");
        let options = SeedOptions {
            project: "web".into(),
            name: Some("fixtures".into()),
            directory: None,
        };
        assert_eq!(
            seed(&mut tree, &options).unwrap().as_deref(),
            Some("apps/web/supabase/fixtures.sql")
        );
    }
}
