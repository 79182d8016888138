//! Layered `.env` loading for Supabase CLI invocations.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Env files in increasing priority.
fn env_layers(workspace_root: &Path, supabase_dir: &Path) -> [PathBuf; 4] {
    let project_root = supabase_dir.join("..");
    [
        workspace_root.join(".env"),
        workspace_root.join(".env.local"),
        project_root.join(".env"),
        project_root.join(".env.local"),
    ]
}

/// Merge the workspace and project `.env` files. Later layers override
/// earlier ones; missing files are skipped.
///
/// # Errors
///
/// A file exists but cannot be read or parsed.
pub fn load_env_layers(workspace_root: &Path, supabase_dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for path in env_layers(workspace_root, supabase_dir) {
        if !path.is_file() {
            continue;
        }
        let iter = dotenvy::from_path_iter(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut count = 0usize;
        for item in iter {
            let (key, value) =
                item.with_context(|| format!("Failed to parse {}", path.display()))?;
            env.insert(key, value);
            count += 1;
        }
        debug!(path = %path.display(), vars = count, "Loaded env file");
    }
    Ok(env)
}
