//! Port registry persisted as a JSON document in the workspace tree.

use super::error::{PortError, PortResult};
use super::models::PortRegistry;
use super::traits::RegistryStore;
use crate::tree::{self, Tree};
use anyhow::anyhow;
use std::path::PathBuf;
use tracing::debug;

/// Build-tool private directory that holds the registry.
pub const REGISTRY_DIR: &str = ".nx";
/// Registry location relative to the workspace root.
pub const REGISTRY_PATH: &str = ".nx/supabase-ports.json";

/// [`RegistryStore`] over a [`Tree`].
///
/// Saving stages the document in the tree; it reaches the disk when the
/// caller flushes the tree.
pub struct TreeRegistryStore<'a> {
    tree: &'a mut dyn Tree,
}

impl<'a> TreeRegistryStore<'a> {
    pub fn new(tree: &'a mut dyn Tree) -> Self {
        Self { tree }
    }

    fn display_path(&self) -> PathBuf {
        self.tree.root().join(REGISTRY_PATH)
    }
}

impl RegistryStore for TreeRegistryStore<'_> {
    fn load(&self) -> PortResult<PortRegistry> {
        let registry = tree::read_json::<PortRegistry>(&*self.tree, REGISTRY_PATH).map_err(
            |source| PortError::StoreRead {
                path: self.display_path(),
                source: source.into(),
            },
        )?;
        Ok(registry.unwrap_or_default())
    }

    fn save(&mut self, registry: &PortRegistry) -> PortResult<()> {
        if !self.tree.exists(REGISTRY_DIR) {
            self.tree.write_str(&format!("{}/.gitkeep", REGISTRY_DIR), "");
        }
        let path = self.display_path();
        tree::write_json(&mut *self.tree, REGISTRY_PATH, registry)
            .map_err(|source| PortError::StoreWrite {
                path,
                source: source.into(),
            })?;
        debug!(projects = registry.len(), "Port registry saved");
        Ok(())
    }
}

/// In-memory [`RegistryStore`], handy when no workspace tree is involved.
#[derive(Debug, Default, Clone)]
pub struct MemoryRegistryStore {
    registry: PortRegistry,
    saves: usize,
    corrupt: bool,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: PortRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Make every subsequent `load` fail as if the document were unreadable.
    pub fn corrupt(&mut self) {
        self.corrupt = true;
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn load(&self) -> PortResult<PortRegistry> {
        if self.corrupt {
            return Err(PortError::StoreRead {
                path: PathBuf::from(REGISTRY_PATH),
                source: anyhow!("registry marked corrupt").into(),
            });
        }
        Ok(self.registry.clone())
    }

    fn save(&mut self, registry: &PortRegistry) -> PortResult<()> {
        self.registry = registry.clone();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::models::PortSet;
    use crate::tree::FsTree;
    use tempfile::TempDir;

    fn sample_ports() -> PortSet {
        PortSet::from_array([54322, 54321, 54323, 54324, 54372, 54332])
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let mut tree = FsTree::new(tmp.path());
        let store = TreeRegistryStore::new(&mut tree);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_nx_dir_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let mut tree = FsTree::new(tmp.path());

        let mut registry = PortRegistry::default();
        registry.insert("web", sample_ports());
        {
            let mut store = TreeRegistryStore::new(&mut tree);
            store.save(&registry).unwrap();
            assert_eq!(store.load().unwrap(), registry);
        }

        assert!(tree.exists(".nx/.gitkeep"));
        tree.flush().unwrap();

        let raw = std::fs::read_to_string(tmp.path().join(REGISTRY_PATH)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["projects"]["web"]["dbPort"], 54322);
        assert_eq!(json["projects"]["web"]["shadowPort"], 54372);
    }

    #[test]
    fn test_save_skips_gitkeep_when_dir_exists() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".nx")).unwrap();
        let mut tree = FsTree::new(tmp.path());
        TreeRegistryStore::new(&mut tree)
            .save(&PortRegistry::default())
            .unwrap();
        assert!(!tree.exists(".nx/.gitkeep"));
    }

    #[test]
    fn test_corrupt_document_is_fatal() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".nx")).unwrap();
        std::fs::write(tmp.path().join(REGISTRY_PATH), "{ not json").unwrap();
        let mut tree = FsTree::new(tmp.path());

        let err = TreeRegistryStore::new(&mut tree).load().unwrap_err();
        assert!(matches!(err, PortError::StoreRead { .. }));
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let tmp = TempDir::new().unwrap();
        let mut tree = FsTree::new(tmp.path());
        let mut store = TreeRegistryStore::new(&mut tree);

        let mut first = PortRegistry::default();
        first.insert("a", sample_ports());
        store.save(&first).unwrap();

        let mut second = PortRegistry::default();
        second.insert("b", sample_ports());
        store.save(&second).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.get("a").is_none());
        assert!(loaded.get("b").is_some());
    }
}
