//! Test helper factories
//!
//! Executor contexts wired to a recording [`MockCommandRunner`], and
//! temporary workspaces with a single project for generator tests.
#![allow(dead_code)]

use crate::executors::ExecutorContext;
use crate::platform::{Docker, SupabaseCli};
use crate::process::MockCommandRunner;
use crate::tree::FsTree;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Executor context builders
// ============================================================================

/// Context for project `web` rooted at `workspace_root`, with every command
/// going through the returned mock. Unscripted commands succeed silently,
/// so Docker counts as running and Supabase as stopped.
pub fn mock_context(workspace_root: impl Into<PathBuf>) -> (ExecutorContext, Arc<MockCommandRunner>) {
    let mock = Arc::new(MockCommandRunner::new());
    let timeout = Duration::from_secs(10);
    let ctx = ExecutorContext {
        workspace_root: workspace_root.into(),
        project_name: "web".to_string(),
        supabase: SupabaseCli::new(mock.clone(), "npx supabase", timeout)
            .expect("valid supabase command"),
        docker: Docker::new(mock.clone(), "docker", timeout).expect("valid docker command"),
    };
    (ctx, mock)
}

// ============================================================================
// Workspace builders
// ============================================================================

/// Temporary workspace with `nx.json`, `.gitignore` and one project at
/// `root` that already has a `build` target.
pub fn workspace_with_project(name: &str, root: &str) -> (TempDir, FsTree) {
    let tmp = TempDir::new().expect("create temp dir");
    std::fs::write(tmp.path().join("nx.json"), "{\n  \"plugins\": []\n}\n").expect("write nx.json");
    std::fs::write(tmp.path().join(".gitignore"), "node_modules\n").expect("write .gitignore");

    let project_dir = tmp.path().join(root);
    std::fs::create_dir_all(&project_dir).expect("create project dir");
    let manifest = serde_json::json!({
        "name": name,
        "root": root,
        "targets": {
            "build": {
                "executor": "@nx/vite:build",
                "options": { "outputPath": format!("dist/{}", root) }
            }
        }
    });
    std::fs::write(
        project_dir.join("project.json"),
        serde_json::to_string_pretty(&manifest).expect("serialize project.json"),
    )
    .expect("write project.json");

    let tree = FsTree::new(tmp.path());
    (tmp, tree)
}
