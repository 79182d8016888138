//! Staging tree over a workspace directory.

use super::{normalize_path, ChangeKind, FileChange, Tree};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
enum Staged {
    Write(Vec<u8>),
    Delete,
}

/// Reads fall through to disk; writes stay in memory until [`flush`](Self::flush).
#[derive(Debug)]
pub struct FsTree {
    root: PathBuf,
    staged: BTreeMap<String, Staged>,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    fn disk_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    /// Apply every staged change to disk and clear the staging area.
    ///
    /// Files are written through a temp file and a rename so a concurrent
    /// reader sees either the old or the new content, never a partial one.
    pub fn flush(&mut self) -> Result<Vec<FileChange>> {
        let changes = self.list_changes();
        let staged = std::mem::take(&mut self.staged);

        for (path, change) in staged {
            let target = self.disk_path(&path);
            match change {
                Staged::Write(bytes) => {
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("create dir {}", parent.display()))?;
                    }
                    write_atomic(&target, &bytes)?;
                }
                Staged::Delete => match std::fs::remove_file(&target) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| format!("remove {}", target.display()))
                    }
                },
            }
        }

        debug!(count = changes.len(), root = %self.root.display(), "Flushed tree changes");
        Ok(changes)
    }

    fn has_staged_descendant(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        self.staged
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .any(|(_, change)| matches!(change, Staged::Write(_)))
    }
}

impl Tree for FsTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &str) -> bool {
        let path = normalize_path(path);
        match self.staged.get(&path) {
            Some(Staged::Write(_)) => return true,
            Some(Staged::Delete) => return self.has_staged_descendant(&path),
            None => {}
        }
        if !path.is_empty() && self.has_staged_descendant(&path) {
            return true;
        }
        self.disk_path(&path).exists()
    }

    fn is_file(&self, path: &str) -> bool {
        let path = normalize_path(path);
        match self.staged.get(&path) {
            Some(Staged::Write(_)) => true,
            Some(Staged::Delete) => false,
            None => self.disk_path(&path).is_file(),
        }
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let path = normalize_path(path);
        match self.staged.get(&path) {
            Some(Staged::Write(bytes)) => return Ok(Some(bytes.clone())),
            Some(Staged::Delete) => return Ok(None),
            None => {}
        }
        let disk = self.disk_path(&path);
        if !disk.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&disk).with_context(|| format!("read {}", disk.display()))?;
        Ok(Some(bytes))
    }

    fn write(&mut self, path: &str, content: &[u8]) {
        self.staged
            .insert(normalize_path(path), Staged::Write(content.to_vec()));
    }

    fn delete(&mut self, path: &str) {
        self.staged.insert(normalize_path(path), Staged::Delete);
    }

    fn children(&self, dir: &str) -> Vec<String> {
        let dir = normalize_path(dir);
        let mut names = BTreeSet::new();

        if let Ok(entries) = std::fs::read_dir(self.disk_path(&dir)) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    names.insert(name.to_string());
                }
            }
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        for (path, change) in &self.staged {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            let name = rest.split('/').next().unwrap_or(rest);
            match change {
                Staged::Write(_) => {
                    names.insert(name.to_string());
                }
                Staged::Delete if !rest.contains('/') => {
                    let child = format!("{}{}", prefix, name);
                    if !self.has_staged_descendant(&child) {
                        names.remove(name);
                    }
                }
                Staged::Delete => {}
            }
        }

        names.into_iter().collect()
    }

    fn list_changes(&self) -> Vec<FileChange> {
        self.staged
            .iter()
            .filter_map(|(path, change)| {
                let on_disk = self.disk_path(path).is_file();
                let kind = match change {
                    Staged::Write(_) if on_disk => ChangeKind::Update,
                    Staged::Write(_) => ChangeKind::Create,
                    Staged::Delete if on_disk => ChangeKind::Delete,
                    Staged::Delete => return None,
                };
                Some(FileChange {
                    path: path.clone(),
                    kind,
                })
            })
            .collect()
    }
}

/// Write through a temp file in the same directory, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().context("tree path has no parent")?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file"),
        std::process::id()
    ));

    {
        let mut file =
            File::create(&tmp).with_context(|| format!("create tmp {}", tmp.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("write tmp {}", tmp.display()))?;
        file.sync_all()
            .with_context(|| format!("sync tmp {}", tmp.display()))?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename tmp {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
