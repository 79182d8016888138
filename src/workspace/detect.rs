//! Project detection
//!
//! Every `supabase/config.toml` that sits next to a `project.json` turns that
//! project into a Supabase project with eight inferred targets. Target names
//! are configurable through the plugin entry in `nx.json`.

use super::{ProjectConfiguration, TargetConfiguration, IGNORED_DIRS, PROJECT_MANIFEST};
use crate::executors::{ExecutorKind, EXECUTOR_PACKAGE};
use crate::tree::{join_path, parent_path};
use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

pub const CONFIG_FILE_GLOB: &str = "**/supabase/config.toml";

/// Target names, read from the plugin entry's `options` in `nx.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginOptions {
    pub start_target_name: String,
    pub stop_target_name: String,
    pub status_target_name: String,
    pub db_reset_target_name: String,
    pub gen_types_target_name: String,
    pub migrate_target_name: String,
    pub db_push_target_name: String,
    pub deploy_target_name: String,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            start_target_name: "supabase-start".into(),
            stop_target_name: "supabase-stop".into(),
            status_target_name: "supabase-status".into(),
            db_reset_target_name: "supabase-db-reset".into(),
            gen_types_target_name: "supabase-gen-types".into(),
            migrate_target_name: "supabase-migrate".into(),
            db_push_target_name: "supabase-db-push".into(),
            deploy_target_name: "supabase-deploy".into(),
        }
    }
}

impl PluginOptions {
    /// Options from the plugin's object-form entry in `nx_json`; defaults
    /// when the plugin is registered by name only or not at all.
    pub fn from_nx_json(nx_json: &Value) -> Result<Self> {
        let entry = nx_json
            .get("plugins")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|p| p.get("plugin").and_then(Value::as_str) == Some(EXECUTOR_PACKAGE));

        match entry.and_then(|e| e.get("options")) {
            Some(options) => serde_json::from_value(options.clone())
                .context("Invalid options for the Supabase plugin in nx.json"),
            None => Ok(Self::default()),
        }
    }

    /// Read `nx.json` under `root`; defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join("nx.json");
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let json: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Self::from_nx_json(&json)
    }

    fn target_name(&self, kind: ExecutorKind) -> Option<&str> {
        let name = match kind {
            ExecutorKind::Start => &self.start_target_name,
            ExecutorKind::Stop => &self.stop_target_name,
            ExecutorKind::Status => &self.status_target_name,
            ExecutorKind::DbReset => &self.db_reset_target_name,
            ExecutorKind::GenTypes => &self.gen_types_target_name,
            ExecutorKind::Migrate => &self.migrate_target_name,
            ExecutorKind::DbPush => &self.db_push_target_name,
            ExecutorKind::Deploy => &self.deploy_target_name,
            ExecutorKind::FunctionsServe => return None,
        };
        Some(name)
    }
}

/// The eight Supabase targets for a project.
///
/// `supabase_path` is the workspace-relative Supabase directory,
/// `supabase_dir` its name inside the project (used in cache inputs).
pub fn supabase_targets(
    project_root: &str,
    supabase_path: &str,
    supabase_dir: &str,
    options: &PluginOptions,
) -> BTreeMap<String, TargetConfiguration> {
    let mut targets = BTreeMap::new();
    for kind in ExecutorKind::ALL {
        let Some(name) = options.target_name(kind) else {
            continue;
        };
        let mut target = TargetConfiguration {
            executor: Some(kind.qualified()),
            options: json!({ "supabaseDirectory": supabase_path }),
            ..Default::default()
        };
        if kind == ExecutorKind::GenTypes {
            target.cache = Some(true);
            target.options["outputPath"] =
                Value::String(join_path(&[project_root, "src/types/supabase.ts"]));
            target.inputs = vec![
                format!("{{projectRoot}}/{}/migrations/**/*", supabase_dir),
                format!("{{projectRoot}}/{}/config.toml", supabase_dir),
            ];
            target.outputs = vec!["{projectRoot}/src/types/supabase.ts".to_string()];
        }
        targets.insert(name.to_string(), target);
    }
    targets
}

/// Workspace-relative paths of every Supabase config file, sorted.
pub fn find_config_files(root: &Path) -> Vec<String> {
    let pattern = match Pattern::new(CONFIG_FILE_GLOB) {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };

    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|name| IGNORED_DIRS.contains(&name))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            pattern.matches(&rel).then_some(rel)
        })
        .collect();
    files.sort();
    files
}

/// A project with inferred Supabase targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredProject {
    pub name: String,
    pub root: String,
    pub targets: BTreeMap<String, TargetConfiguration>,
}

/// Turn config files into projects, keyed by project root.
///
/// A config file is skipped when its project has no readable, named
/// `project.json` (for example a workspace-level `supabase/` folder).
pub fn create_nodes(
    root: &Path,
    config_files: &[String],
    options: &PluginOptions,
) -> BTreeMap<String, InferredProject> {
    let mut nodes = BTreeMap::new();
    for file in config_files {
        let supabase_path = parent_path(file);
        let project_root = parent_path(&supabase_path);
        let manifest = root.join(join_path(&[&project_root, PROJECT_MANIFEST]));

        let Some(name) = read_project_name(&manifest) else {
            debug!(config = %file, "No named project.json next to Supabase config, skipping");
            continue;
        };

        let targets = supabase_targets(&project_root, &supabase_path, "supabase", options);
        nodes.insert(
            project_root.clone(),
            InferredProject {
                name,
                root: project_root,
                targets,
            },
        );
    }
    nodes
}

fn read_project_name(manifest: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(manifest).ok()?;
    let config: ProjectConfiguration = serde_json::from_str(&raw).ok()?;
    config.name.filter(|n| !n.is_empty())
}
