//! Integration tests for port allocation against a workspace on disk
//!
//! The registry lives in `.nx/supabase-ports.json`; these tests go through
//! the same tree + lock path the CLI uses.

use nxsupabase::ports::{
    calculate_ports, MockPortProber, OsPortProber, PortAllocator, PortProber, PortRegistry, PortSet,
    RegistryStore, TreeRegistryStore, REGISTRY_PATH,
};
use nxsupabase::tree::FsTree;
use nxsupabase::workspace::WorkspaceLock;
use std::path::Path;
use tempfile::TempDir;

/// One CLI-style allocation: lock, stage, flush.
async fn allocate_and_flush(
    root: &Path,
    allocator: &PortAllocator<MockPortProber>,
    project: &str,
) -> PortSet {
    let _lock = WorkspaceLock::acquire(root).await.unwrap();
    let mut tree = FsTree::new(root);
    let ports = {
        let mut store = TreeRegistryStore::new(&mut tree);
        allocator.get_ports(&mut store, project, None).await.unwrap()
    };
    tree.flush().unwrap();
    ports
}

fn registry_on_disk(root: &Path) -> PortRegistry {
    let raw = std::fs::read_to_string(root.join(REGISTRY_PATH)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn test_allocation_survives_new_process_view() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());

    let first = allocate_and_flush(tmp.path(), &allocator, "web").await;
    assert_eq!(first, calculate_ports("web"));
    assert_eq!(registry_on_disk(tmp.path()).get("web"), Some(&first));

    // A fresh allocator with every port "busy" must still hand back the
    // registered set without probing.
    let busy = PortAllocator::new(MockPortProber::with_occupied(first.as_array()));
    let again = allocate_and_flush(tmp.path(), &busy, "web").await;
    assert_eq!(again, first);
    assert_eq!(busy.prober().calls(), 0);
}

#[tokio::test]
async fn test_registry_file_format() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());
    let ports = allocate_and_flush(tmp.path(), &allocator, "api").await;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join(REGISTRY_PATH)).unwrap())
            .unwrap();
    assert_eq!(raw["projects"]["api"]["dbPort"], ports.db_port);
    assert_eq!(raw["projects"]["api"]["poolerPort"], ports.pooler_port);
}

#[tokio::test]
async fn test_lock_serializes_concurrent_allocations() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());

    let (a, b) = tokio::join!(
        allocate_and_flush(tmp.path(), &allocator, "web"),
        allocate_and_flush(tmp.path(), &allocator, "admin"),
    );

    // Both entries made it: neither run overwrote the other's registry.
    let registry = registry_on_disk(tmp.path());
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("web"), Some(&a));
    assert_eq!(registry.get("admin"), Some(&b));
}

#[tokio::test]
async fn test_try_acquire_sees_held_lock() {
    let tmp = TempDir::new().unwrap();
    let held = WorkspaceLock::acquire(tmp.path()).await.unwrap();
    assert!(held.path().ends_with(".nx/supabase-ports.lock"));
    assert!(WorkspaceLock::try_acquire(tmp.path()).unwrap().is_none());

    drop(held);
    assert!(WorkspaceLock::try_acquire(tmp.path()).unwrap().is_some());
}

#[tokio::test]
async fn test_release_then_list() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());
    allocate_and_flush(tmp.path(), &allocator, "web").await;
    allocate_and_flush(tmp.path(), &allocator, "docs").await;

    let mut tree = FsTree::new(tmp.path());
    {
        let mut store = TreeRegistryStore::new(&mut tree);
        allocator.release_ports(&mut store, "web").unwrap();
        let listed = allocator.list_allocated(&store).unwrap();
        assert!(listed.get("web").is_none());
        assert!(listed.get("docs").is_some());
    }
    tree.flush().unwrap();
    assert_eq!(registry_on_disk(tmp.path()).len(), 1);
}

#[tokio::test]
async fn test_corrupt_registry_on_disk_is_an_error() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".nx")).unwrap();
    std::fs::write(tmp.path().join(REGISTRY_PATH), "{ not json").unwrap();

    let allocator = PortAllocator::new(MockPortProber::new());
    let mut tree = FsTree::new(tmp.path());
    let mut store = TreeRegistryStore::new(&mut tree);
    assert!(store.load().is_err());
    assert!(allocator.get_ports(&mut store, "web", None).await.is_err());
}

#[tokio::test]
async fn test_os_prober_skips_bound_port() {
    // Grab a free port from the OS and keep it bound.
    let listener = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let busy = listener.local_addr().unwrap().port();
    let prober = OsPortProber::new(50);

    let found = prober.find_available(busy).await.unwrap();
    assert!(found > busy);
}

#[tokio::test]
async fn test_listing_fresh_workspace_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());

    // `nxsupabase ports list` reads without the workspace lock.
    let mut tree = FsTree::new(tmp.path());
    let store = TreeRegistryStore::new(&mut tree);
    assert!(allocator.list_allocated(&store).unwrap().is_empty());
    drop(store);
    assert!(tree.flush().unwrap().is_empty());
    assert!(!tmp.path().join(".nx").exists());
}

#[tokio::test]
async fn test_bucket_mates_on_disk_get_disjoint_ports() {
    let tmp = TempDir::new().unwrap();
    let allocator = PortAllocator::new(MockPortProber::new());
    let web_db = calculate_ports("web").db_port;
    let mate = (0..)
        .map(|i| format!("proj-{i}"))
        .find(|name| calculate_ports(name).db_port == web_db)
        .unwrap();

    let web = allocate_and_flush(tmp.path(), &allocator, "web").await;
    let other = allocate_and_flush(tmp.path(), &allocator, &mate).await;

    let web = web.as_array();
    assert!(other.as_array().iter().all(|p| !web.contains(p)));
    assert_eq!(registry_on_disk(tmp.path()).len(), 2);
}
