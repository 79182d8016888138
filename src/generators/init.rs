//! Workspace initialisation: plugin registration, cache defaults, ignores.

use super::ensure_dir;
use super::templates::WORKSPACE_GITIGNORE_BLOCK;
use crate::executors::EXECUTOR_PACKAGE;
use crate::ports::store::REGISTRY_DIR;
use crate::tree::{update_json, Tree};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info};

pub const NX_JSON: &str = "nx.json";
pub const GEN_TYPES_TARGET: &str = "supabase-gen-types";

#[derive(Debug, Clone, Default, clap::Args)]
pub struct InitOptions {
    /// Don't print CLI install instructions
    #[arg(long)]
    pub skip_install: bool,
}

fn is_registered(plugins: &[Value]) -> bool {
    plugins.iter().any(|p| match p {
        Value::String(name) => name == EXECUTOR_PACKAGE,
        Value::Object(entry) => entry.get("plugin").and_then(Value::as_str) == Some(EXECUTOR_PACKAGE),
        _ => false,
    })
}

fn register_plugin(nx_json: &mut Value) -> Result<()> {
    let root = nx_json.as_object_mut().context("nx.json is not a JSON object")?;

    let plugins = root
        .entry("plugins")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .context("nx.json `plugins` is not an array")?;
    if !is_registered(plugins) {
        plugins.push(json!({
            "plugin": EXECUTOR_PACKAGE,
            "options": {
                "startTargetName": "supabase-start",
                "stopTargetName": "supabase-stop",
                "genTypesTargetName": GEN_TYPES_TARGET,
                "dbResetTargetName": "supabase-db-reset",
                "deployTargetName": "supabase-deploy"
            }
        }));
        debug!("Registered Supabase plugin in nx.json");
    }

    let defaults = root
        .entry("targetDefaults")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .context("nx.json `targetDefaults` is not an object")?;
    defaults.entry(GEN_TYPES_TARGET).or_insert_with(|| {
        json!({
            "cache": true,
            "inputs": [
                "{projectRoot}/supabase/migrations/**/*",
                "{projectRoot}/supabase/config.toml"
            ],
            "outputs": ["{projectRoot}/src/types/supabase.ts"]
        })
    });
    Ok(())
}

/// Prepare the workspace for Supabase projects. Safe to run repeatedly.
///
/// 1. Register the plugin in `nx.json` (when the file exists)
/// 2. Add cache defaults for the type generation target
/// 3. Append the Supabase block to `.gitignore` (when the file exists)
/// 4. Make sure `.nx/` exists for the port registry
pub fn init(tree: &mut dyn Tree, options: &InitOptions) -> Result<()> {
    if tree.exists(NX_JSON) {
        update_json(tree, NX_JSON, register_plugin)?;
    }

    if let Some(mut gitignore) = tree.read_to_string(".gitignore")? {
        if !gitignore.contains(".supabase/") {
            gitignore.push_str(WORKSPACE_GITIGNORE_BLOCK);
            tree.write_str(".gitignore", &gitignore);
        }
    }

    ensure_dir(tree, REGISTRY_DIR);

    if !options.skip_install {
        info!("Supabase plugin initialized successfully!");
        info!("Ensure the Supabase CLI is installed:");
        info!("  npm install -g supabase");
        info!("  # or");
        info!("  brew install supabase/tap/supabase");
        info!("Next steps:");
        info!("  1. Run `nxsupabase project --project <your-app>` to add Supabase to a project");
        info!("  2. Run `nxsupabase run <your-app>:supabase-start` to start local Supabase");
    }
    Ok(())
}
