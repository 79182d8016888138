//! Scaffolding generators
//!
//! Generators stage their output in a [`Tree`](crate::tree::Tree); nothing
//! touches the disk until the caller flushes the tree. An error aborts the
//! run before anything is flushed.

pub mod function;
pub mod init;
pub mod migration;
pub mod names;
pub mod project;
pub mod seed;
pub mod templates;

pub use function::{function, FunctionOptions, FunctionTemplate};
pub use init::{init, InitOptions};
pub use migration::{migration, migration_at, MigrationOptions};
pub use names::{names, Names};
pub use project::{project, ProjectOptions};
pub use seed::{seed, SeedOptions};

use crate::tree::{self, Tree};

/// Supabase directory name inside a project unless overridden.
pub const DEFAULT_SUPABASE_DIR: &str = "supabase";

/// Ensure `dir` shows up in the tree, adding a `.gitkeep` when it is missing.
pub(crate) fn ensure_dir(tree: &mut dyn Tree, dir: &str) {
    if !tree.exists(dir) {
        tree.write_str(&tree::join_path(&[dir, ".gitkeep"]), "");
    }
}

pub(crate) fn supabase_dir(directory: Option<&str>) -> &str {
    directory.filter(|d| !d.is_empty()).unwrap_or(DEFAULT_SUPABASE_DIR)
}
