//! End-to-end generator runs against a real workspace directory
//!
//! Each test stages changes through an `FsTree`, flushes, and then checks
//! the files on disk and what project detection infers from them.

use nxsupabase::generators::{
    function, init, migration_at, project, seed, FunctionOptions, InitOptions, MigrationOptions,
    ProjectOptions, SeedOptions,
};
use nxsupabase::ports::{calculate_ports, MockPortProber, PortAllocator, PortRegistry};
use nxsupabase::tree::{ChangeKind, FsTree, Tree};
use nxsupabase::workspace::{create_nodes, find_config_files, PluginOptions};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("nx.json"), r#"{"plugins":[]}"#).unwrap();
    std::fs::write(tmp.path().join(".gitignore"), "node_modules\n").unwrap();
    for (name, root) in [("web", "apps/web"), ("admin", "apps/admin")] {
        std::fs::create_dir_all(tmp.path().join(root)).unwrap();
        std::fs::write(
            tmp.path().join(root).join("project.json"),
            format!(r#"{{"name":"{}","targets":{{}}}}"#, name),
        )
        .unwrap();
    }
    tmp
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

#[tokio::test]
async fn test_full_scaffold_then_detect() {
    let tmp = workspace();
    let allocator = PortAllocator::new(MockPortProber::new());
    let mut tree = FsTree::new(tmp.path());

    init(&mut tree, &InitOptions { skip_install: true }).unwrap();
    let ports = project(&mut tree, &ProjectOptions::new("web"), &allocator)
        .await
        .unwrap();
    tree.flush().unwrap();

    let config = read(tmp.path(), "apps/web/supabase/config.toml");
    assert!(config.contains("project_id = \"web\""));
    assert!(config.contains(&format!("port = {}", ports.api_port)));
    assert!(config.contains(&format!("shadow_port = {}", ports.shadow_port)));
    assert_eq!(ports, calculate_ports("web"));

    let nx: Value = serde_json::from_str(&read(tmp.path(), "nx.json")).unwrap();
    assert_eq!(nx["plugins"][0]["plugin"], "@nxsupabase/supabase");

    let files = find_config_files(tmp.path());
    assert_eq!(files, vec!["apps/web/supabase/config.toml"]);
    let nodes = create_nodes(
        tmp.path(),
        &files,
        &PluginOptions::load(tmp.path()).unwrap(),
    );
    let web = &nodes["apps/web"];
    assert_eq!(web.name, "web");
    assert_eq!(
        web.targets["supabase-start"].executor.as_deref(),
        Some("@nxsupabase/supabase:start")
    );
    assert_eq!(web.targets.len(), 8);
}

#[tokio::test]
async fn test_two_projects_get_disjoint_ports() {
    let tmp = workspace();
    let allocator = PortAllocator::new(MockPortProber::new());

    for name in ["web", "admin"] {
        let mut tree = FsTree::new(tmp.path());
        project(&mut tree, &ProjectOptions::new(name), &allocator)
            .await
            .unwrap();
        tree.flush().unwrap();
    }

    let registry: PortRegistry =
        serde_json::from_str(&read(tmp.path(), ".nx/supabase-ports.json")).unwrap();
    assert_eq!(registry.len(), 2);

    let web = registry.get("web").unwrap().as_array();
    let admin = registry.get("admin").unwrap().as_array();
    assert!(web.iter().all(|p| !admin.contains(p)));
    assert!(read(tmp.path(), "apps/admin/supabase/config.toml")
        .contains(&format!("port = {}", admin[0])));
}

#[tokio::test]
async fn test_dry_run_leaves_disk_untouched() {
    let tmp = workspace();
    let allocator = PortAllocator::new(MockPortProber::new());
    let mut tree = FsTree::new(tmp.path());

    project(&mut tree, &ProjectOptions::new("web"), &allocator)
        .await
        .unwrap();
    let changes = tree.list_changes();
    assert!(changes
        .iter()
        .any(|c| c.path == "apps/web/supabase/config.toml" && c.kind == ChangeKind::Create));
    assert!(changes
        .iter()
        .any(|c| c.path == "apps/web/project.json" && c.kind == ChangeKind::Update));

    drop(tree);
    assert!(!tmp.path().join("apps/web/supabase").exists());
    assert!(!tmp.path().join(".nx/supabase-ports.json").exists());
    assert_eq!(read(tmp.path(), "nx.json"), r#"{"plugins":[]}"#);
}

#[tokio::test]
async fn test_follow_up_generators_on_scaffolded_project() {
    let tmp = workspace();
    let allocator = PortAllocator::new(MockPortProber::new());
    let mut tree = FsTree::new(tmp.path());
    project(&mut tree, &ProjectOptions::new("web"), &allocator)
        .await
        .unwrap();

    let now = chrono::DateTime::parse_from_rfc3339("2025-01-02T03:04:05+00:00").unwrap();
    let migration_path = migration_at(
        &mut tree,
        &MigrationOptions {
            name: "add profiles".into(),
            project: "web".into(),
            ..Default::default()
        },
        now,
    )
    .unwrap();
    let seed_path = seed(
        &mut tree,
        &SeedOptions {
            project: "web".into(),
            ..Default::default()
        },
    )
    .unwrap();
    let function_dir = function(&mut tree, &FunctionOptions::new("hello-world", "web")).unwrap();
    tree.flush().unwrap();

    assert_eq!(
        migration_path,
        "apps/web/supabase/migrations/20250102030405_add_profiles.sql"
    );
    assert!(tmp.path().join(&migration_path).is_file());
    assert_eq!(seed_path.as_deref(), Some("apps/web/supabase/seed.sql"));
    assert!(tmp.path().join(&function_dir).join("index.ts").is_file());

    let config = read(tmp.path(), "apps/web/supabase/config.toml");
    assert!(config.contains("[functions.hello-world]\nverify_jwt = true\n"));
}

#[test]
fn test_generator_error_stages_nothing_on_disk() {
    let tmp = workspace();
    let mut tree = FsTree::new(tmp.path());
    let result = seed(
        &mut tree,
        &SeedOptions {
            project: "missing".into(),
            ..Default::default()
        },
    );
    assert!(result.is_err());
    assert!(tree.list_changes().is_empty());
}
