//! Workspace lock for the port registry
//!
//! An `fs2` advisory lock on `.nx/supabase-ports.lock`, held while a
//! generator or `ports` command reads and rewrites the registry so
//! concurrent runs never hand out the same ports.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

pub const LOCK_PATH: &str = ".nx/supabase-ports.lock";

/// Exclusive advisory lock on the workspace's port registry, released on drop.
///
/// Held by the CLI for the whole of a generator run so two concurrent runs
/// cannot hand out the same ports.
#[derive(Debug)]
pub struct WorkspaceLock {
    file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    /// Block until the lock is ours.
    pub async fn acquire(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(LOCK_PATH);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }

        tokio::task::spawn_blocking(move || -> Result<Self> {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .with_context(|| format!("open workspace lock {}", path.display()))?;

            let start = Instant::now();
            file.lock_exclusive()
                .with_context(|| format!("acquire workspace lock {}", path.display()))?;
            debug!(
                path = %path.display(),
                wait_ms = start.elapsed().as_millis() as u64,
                "Workspace lock acquired"
            );
            Ok(Self { file, path })
        })
        .await
        .context("join workspace lock task")?
    }

    /// Take the lock only if nobody else holds it.
    pub fn try_acquire(workspace_root: &Path) -> Result<Option<Self>> {
        let path = workspace_root.join(LOCK_PATH);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("open workspace lock {}", path.display()))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(err) if is_contended(&err) => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("try workspace lock {}", path.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether `err` is fs2's "someone else holds the lock" error.
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let tmp = TempDir::new().unwrap();
        let lock = WorkspaceLock::acquire(tmp.path()).await.unwrap();
        assert!(lock.path().ends_with("supabase-ports.lock"));
        assert!(WorkspaceLock::try_acquire(tmp.path()).unwrap().is_none());

        drop(lock);
        assert!(WorkspaceLock::try_acquire(tmp.path()).unwrap().is_some());
    }

    #[test]
    fn test_contention_error_is_recognised() {
        assert!(is_contended(&fs2::lock_contended_error()));
        assert!(!is_contended(&io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied"
        )));
    }

    #[test]
    fn test_try_acquire_propagates_open_errors() {
        let tmp = TempDir::new().unwrap();
        // `.nx` is a file, so the lock directory cannot be created.
        std::fs::write(tmp.path().join(".nx"), "").unwrap();
        let err = WorkspaceLock::try_acquire(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("create"));
    }
}
