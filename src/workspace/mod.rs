//! Workspace model: project manifests, Supabase project detection and the
//! workspace lock.

pub mod detect;
pub mod lock;

pub use detect::{create_nodes, find_config_files, supabase_targets, InferredProject, PluginOptions};
pub use lock::WorkspaceLock;

use crate::tree::{self, Tree};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Directories never searched for project manifests.
pub const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist", "target", ".nx"];

pub const PROJECT_MANIFEST: &str = "project.json";

/// One build target in a project manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Fields this tool does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of a `project.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, TargetConfiguration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A project found in the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    /// Workspace-relative directory holding the manifest (`""` at the root).
    pub root: String,
    pub config: ProjectConfiguration,
}

impl Project {
    pub fn manifest_path(&self) -> String {
        tree::join_path(&[&self.root, PROJECT_MANIFEST])
    }
}

fn collect_projects(tree: &dyn Tree, dir: &str, found: &mut Vec<Project>) -> Result<()> {
    let manifest = tree::join_path(&[dir, PROJECT_MANIFEST]);
    if tree.is_file(&manifest) {
        let config: ProjectConfiguration = tree::read_json(tree, &manifest)?.unwrap_or_default();
        if let Some(name) = config.name.clone() {
            found.push(Project {
                name,
                root: dir.to_string(),
                config,
            });
        }
    }

    for child in tree.children(dir) {
        if IGNORED_DIRS.contains(&child.as_str()) {
            continue;
        }
        let path = tree::join_path(&[dir, &child]);
        if !tree.is_file(&path) {
            collect_projects(tree, &path, found)?;
        }
    }
    Ok(())
}

/// Every named project in the workspace, sorted by root.
pub fn list_projects(tree: &dyn Tree) -> Result<Vec<Project>> {
    let mut projects = Vec::new();
    collect_projects(tree, "", &mut projects)?;
    projects.sort_by(|a, b| a.root.cmp(&b.root));
    Ok(projects)
}

/// Look a project up by name.
///
/// # Errors
///
/// No manifest declares `name`, or a manifest is not valid JSON.
pub fn read_project(tree: &dyn Tree, name: &str) -> Result<Project> {
    let projects = list_projects(tree).context("Failed to scan workspace projects")?;
    match projects.into_iter().find(|p| p.name == name) {
        Some(project) => Ok(project),
        None => bail!("Cannot find configuration for '{}'", name),
    }
}

/// Stage `project.config` back into its manifest.
pub fn write_project(tree: &mut dyn Tree, project: &Project) -> Result<()> {
    tree::write_json(tree, &project.manifest_path(), &project.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FsTree;
    use tempfile::TempDir;

    #[test]
    fn test_read_project_by_name() {
        let tmp = TempDir::new().unwrap();
        let mut tree = FsTree::new(tmp.path());
        tree.write_str("apps/web/project.json", r#"{"name":"web","root":"apps/web"}"#);
        tree.write_str("libs/ui/project.json", r#"{"name":"ui"}"#);
        tree.write_str("node_modules/pkg/project.json", r#"{"name":"hidden"}"#);
        tree.write_str("apps/nameless/project.json", r#"{}"#);

        let project = read_project(&tree, "web").unwrap();
        assert_eq!(project.root, "apps/web");
        assert_eq!(project.config.extra["root"], "apps/web");

        let names: Vec<String> = list_projects(&tree).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["web", "ui"]);

        let err = read_project(&tree, "hidden").unwrap_err();
        assert!(err.to_string().contains("Cannot find configuration for 'hidden'"));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = r#"{
            "name": "web",
            "sourceRoot": "apps/web/src",
            "tags": ["scope:web"],
            "targets": {
                "build": { "executor": "@nx/vite:build", "dependsOn": ["^build"], "options": { "outputPath": "dist" } }
            }
        }"#;
        let config: ProjectConfiguration = serde_json::from_str(raw).unwrap();
        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["sourceRoot"], "apps/web/src");
        assert_eq!(back["targets"]["build"]["dependsOn"][0], "^build");
        assert_eq!(back["targets"]["build"]["options"]["outputPath"], "dist");
        assert!(back["targets"]["build"].get("cache").is_none());
    }
}
