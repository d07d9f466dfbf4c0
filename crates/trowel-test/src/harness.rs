//! Test harness helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use trowel_vfs::{AccessMode, SandboxedFs};

use crate::mocks::MemoryTree;

/// Create a temporary directory for testing.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::with_prefix("trowel-").expect("Failed to create temp directory")
}

/// Write a file below `root`, creating parent directories.
///
/// Goes straight to disk, bypassing any facade.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
pub fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// Set up test logging with the given filter.
///
/// # Example
///
/// ```rust,ignore
/// use trowel_test::setup_test_logging;
///
/// #[test]
/// fn my_test() {
///     setup_test_logging("trowel_vfs=debug");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A temporary directory with a facade rooted in it.
#[derive(Debug)]
pub struct Sandbox {
    /// Backing directory, removed on drop.
    pub dir: TempDir,
    /// Facade rooted at `dir`.
    pub fs: SandboxedFs,
}

impl Sandbox {
    /// Create an enforcing read-write sandbox.
    ///
    /// # Panics
    ///
    /// Panics if the directory or facade cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(true, AccessMode::ReadWrite)
    }

    /// Create a sandbox with explicit enforcement and access mode.
    ///
    /// # Panics
    ///
    /// Panics if the directory or facade cannot be created.
    #[must_use]
    pub fn with_options(enforce_root: bool, mode: AccessMode) -> Self {
        let dir = test_dir();
        let fs = SandboxedFs::new(dir.path(), enforce_root)
            .expect("Failed to create sandboxed fs")
            .with_mode(mode);
        Self { dir, fs }
    }

    /// Path to the backing directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Seed a file on disk, bypassing the facade.
    pub fn seed(&self, name: &str, content: &str) -> PathBuf {
        write_file(self.dir.path(), name, content)
    }

    /// Read a file from disk, bypassing the facade.
    #[must_use]
    pub fn disk_text(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(name)).ok()
    }

    /// Attach a fresh [`MemoryTree`] and return it.
    ///
    /// # Panics
    ///
    /// Panics if a tree is already attached.
    pub async fn attach_memory_tree(&self) -> Arc<MemoryTree> {
        let tree = Arc::new(MemoryTree::new());
        self.fs
            .attach_tree(tree.clone())
            .await
            .expect("Failed to attach memory tree");
        tree
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir() {
        let dir = test_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = test_dir();
        let path = write_file(dir.path(), "subdir/test.txt", "content");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "content");
    }

    #[tokio::test]
    async fn test_sandbox_seed_is_visible_through_facade() {
        let sandbox = Sandbox::new();
        sandbox.seed("a/b.txt", "hello");
        assert_eq!(sandbox.fs.read_text("a/b.txt").await.unwrap().unwrap(), "hello");
        assert_eq!(sandbox.disk_text("a/b.txt").as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_attach_memory_tree() {
        let sandbox = Sandbox::new();
        let tree = sandbox.attach_memory_tree().await;
        assert!(sandbox.fs.is_virtual().await);
        sandbox.fs.create_text("x.txt", "x").await.unwrap();
        assert_eq!(tree.changes().len(), 1);
        assert!(sandbox.disk_text("x.txt").is_none());
    }
}
