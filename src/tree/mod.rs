//! Virtual file tree used by generators
//!
//! Generators never touch the disk directly: they stage writes and deletes
//! against a [`Tree`], and the caller decides whether to flush (apply) or
//! only list the changes (dry run). Paths are workspace-relative and always
//! use `/` as separator.
//!
//! Architecture follows the project pattern (trait + impl):
//! - `Tree` trait: read/write/exists/children over staged state
//! - `FsTree`: staging layer over a workspace directory on disk

pub mod fs;

pub use fs::FsTree;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Kind of a staged change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// A staged (or applied) change to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self.kind {
            ChangeKind::Create => "CREATE",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        };
        write!(f, "{} {}", verb, self.path)
    }
}

/// Staged view of a workspace.
pub trait Tree {
    /// Workspace root on disk.
    fn root(&self) -> &Path;

    /// True for files and for directories that contain anything.
    fn exists(&self, path: &str) -> bool;

    fn is_file(&self, path: &str) -> bool;

    /// File contents, or `None` when the file does not exist.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    fn write(&mut self, path: &str, content: &[u8]);

    fn delete(&mut self, path: &str);

    /// Names of the direct children of `dir`, sorted.
    fn children(&self, dir: &str) -> Vec<String>;

    /// Changes staged so far, sorted by path.
    fn list_changes(&self) -> Vec<FileChange>;

    fn read_to_string(&self, path: &str) -> Result<Option<String>> {
        match self.read(path)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes)
                    .with_context(|| format!("{} is not valid UTF-8", path))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn write_str(&mut self, path: &str, content: &str) {
        self.write(path, content.as_bytes());
    }
}

/// Normalize a workspace-relative path: `/` separators, no empty or `.`
/// segments, `..` resolved.
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join path fragments and normalize the result.
pub fn join_path(fragments: &[&str]) -> String {
    normalize_path(&fragments.join("/"))
}

/// Parent directory of a normalized path (`""` for top-level entries).
pub fn parent_path(path: &str) -> String {
    let path = normalize_path(path);
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Parse a JSON file from the tree. `Ok(None)` when the file is absent.
pub fn read_json<T: DeserializeOwned>(tree: &dyn Tree, path: &str) -> Result<Option<T>> {
    let Some(content) = tree.read_to_string(path)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path))?;
    Ok(Some(value))
}

/// Write `value` as pretty JSON with a trailing newline.
pub fn write_json<T: Serialize>(tree: &mut dyn Tree, path: &str, value: &T) -> Result<()> {
    let mut formatted = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path))?;
    formatted.push('\n');
    tree.write_str(path, &formatted);
    Ok(())
}

/// Read-modify-write a JSON document. Missing files start as `{}`.
pub fn update_json<F>(tree: &mut dyn Tree, path: &str, update: F) -> Result<()>
where
    F: FnOnce(&mut Value) -> Result<()>,
{
    let mut json: Value =
        read_json(tree, path)?.unwrap_or_else(|| Value::Object(Default::default()));
    update(&mut json)?;
    write_json(tree, path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("apps/web/"), "apps/web");
        assert_eq!(normalize_path("./apps//web"), "apps/web");
        assert_eq!(normalize_path("apps\\web\\supabase"), "apps/web/supabase");
        assert_eq!(normalize_path("apps/web/supabase/.."), "apps/web");
        assert_eq!(normalize_path("."), "");
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join_path(&["apps/web", "supabase", "config.toml"]), "apps/web/supabase/config.toml");
        assert_eq!(join_path(&["", "supabase"]), "supabase");
        assert_eq!(parent_path("apps/web/supabase"), "apps/web");
        assert_eq!(parent_path("nx.json"), "");
    }
}
