use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{BackendKind, ResolvedPath, StorageBackend, VfsError, VfsResult};

/// Entries directly inside a virtual tree directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDir {
    /// Names of sub-directories.
    pub subdirs: Vec<String>,
    /// Names of files.
    pub subfiles: Vec<String>,
}

/// An externally owned, change-recording file tree.
///
/// Paths are absolute within the tree (`/a/b`, the root is `/`).
/// Mutations record intent rather than touching durable storage; whoever
/// owns the tree decides later whether to commit them. Implementations use
/// interior mutability so one tree can be shared through an `Arc`.
pub trait VirtualTree: Send + Sync {
    /// File content, or `None` when no file is recorded at `path`.
    fn read(&self, path: &str) -> Option<Vec<u8>>;

    /// Record a new file.
    ///
    /// # Errors
    ///
    /// Implementation defined; surfaced as [`VfsError::Backend`] or any
    /// other variant the tree chooses.
    fn create(&self, path: &str, content: &[u8]) -> VfsResult<()>;

    /// Record new content for an existing file.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn overwrite(&self, path: &str, content: &[u8]) -> VfsResult<()>;

    /// Record a deletion.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn delete(&self, path: &str) -> VfsResult<()>;

    /// Record a move.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn rename(&self, from: &str, to: &str) -> VfsResult<()>;

    /// Whether a file or a directory with recorded entries exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Entries directly inside the directory at `path`.
    fn get_dir(&self, path: &str) -> TreeDir;
}

/// Adapts a [`VirtualTree`] to the [`StorageBackend`] contract.
#[derive(Clone)]
pub struct VirtualTreeBackend {
    tree: Arc<dyn VirtualTree>,
}

impl VirtualTreeBackend {
    /// Wrap a shared tree.
    #[must_use]
    pub fn new(tree: Arc<dyn VirtualTree>) -> Self {
        Self { tree }
    }

    /// The wrapped tree.
    #[must_use]
    pub fn tree(&self) -> &Arc<dyn VirtualTree> {
        &self.tree
    }
}

impl fmt::Debug for VirtualTreeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualTreeBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageBackend for VirtualTreeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::VirtualTree
    }

    async fn read(&self, path: &ResolvedPath) -> VfsResult<Vec<u8>> {
        self.tree
            .read(&path.to_tree_path())
            .ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    async fn create(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()> {
        self.tree.create(&path.to_tree_path(), content)
    }

    async fn overwrite(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()> {
        self.tree.overwrite(&path.to_tree_path(), content)
    }

    async fn delete(&self, path: &ResolvedPath) -> VfsResult<()> {
        self.tree.delete(&path.to_tree_path())
    }

    async fn rename(&self, from: &ResolvedPath, to: &ResolvedPath) -> VfsResult<()> {
        self.tree.rename(&from.to_tree_path(), &to.to_tree_path())
    }

    async fn exists(&self, path: &ResolvedPath) -> VfsResult<bool> {
        Ok(self.tree.exists(&path.to_tree_path()))
    }

    async fn list(&self, path: &ResolvedPath) -> VfsResult<Vec<String>> {
        let tree_path = path.to_tree_path();
        if self.tree.read(&tree_path).is_some() {
            return Err(VfsError::NotADirectory(path.to_string()));
        }
        if !self.tree.exists(&tree_path) {
            return Err(VfsError::NotFound(path.to_string()));
        }

        let TreeDir { subdirs, subfiles } = self.tree.get_dir(&tree_path);
        let mut names: Vec<String> = subdirs.into_iter().chain(subfiles).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
