use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::path::{is_within, join};
use crate::{BackendKind, ResolvedPath, StorageBackend, VfsError, VfsResult};

/// A [`StorageBackend`] backed by the physical host filesystem.
///
/// Every resolved path is joined onto `root`. A path that escapes the root
/// is refused here as well, whatever the facade decided, so this backend can
/// never touch files outside its directory.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    root: PathBuf,
}

impl DiskBackend {
    /// Create a disk backend rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The host directory all paths are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &ResolvedPath) -> VfsResult<PathBuf> {
        let target = path.to_host_path(&self.root);
        if path.escapes_root() || !is_within(&self.root, &target) {
            return Err(VfsError::PathEscape {
                input: path.to_string(),
                target: join(&self.root.to_string_lossy(), path.as_str()),
            });
        }
        Ok(target)
    }

    fn reject_root(path: &ResolvedPath) -> VfsResult<()> {
        if path.is_root() {
            return Err(VfsError::PermissionDenied(
                "Cannot operate on the root boundary directly".into(),
            ));
        }
        Ok(())
    }
}

/// Map an IO error onto the precondition variants where one applies.
fn map_io(err: std::io::Error, path: &ResolvedPath) -> VfsError {
    match err.kind() {
        ErrorKind::NotFound => VfsError::NotFound(path.to_string()),
        ErrorKind::AlreadyExists => VfsError::AlreadyExists(path.to_string()),
        _ => VfsError::Io(err),
    }
}

#[async_trait]
impl StorageBackend for DiskBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Disk
    }

    async fn read(&self, path: &ResolvedPath) -> VfsResult<Vec<u8>> {
        let target = self.host_path(path)?;
        tokio::fs::read(&target).await.map_err(|e| map_io(e, path))
    }

    async fn create(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()> {
        Self::reject_root(path)?;
        let target = self.host_path(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| map_io(e, path))?;
        file.write_all(content).await?;
        file.flush().await?;
        debug!(path = %target.display(), bytes = content.len(), "created file");
        Ok(())
    }

    async fn overwrite(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()> {
        Self::reject_root(path)?;
        let target = self.host_path(path)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&target)
            .await
            .map_err(|e| map_io(e, path))?;
        file.write_all(content).await?;
        file.flush().await?;
        debug!(path = %target.display(), bytes = content.len(), "overwrote file");
        Ok(())
    }

    async fn delete(&self, path: &ResolvedPath) -> VfsResult<()> {
        Self::reject_root(path)?;
        let target = self.host_path(path)?;
        let meta = tokio::fs::symlink_metadata(&target)
            .await
            .map_err(|e| map_io(e, path))?;
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&target).await?;
        } else {
            tokio::fs::remove_file(&target).await?;
        }
        debug!(path = %target.display(), "deleted");
        Ok(())
    }

    async fn rename(&self, from: &ResolvedPath, to: &ResolvedPath) -> VfsResult<()> {
        Self::reject_root(from)?;
        Self::reject_root(to)?;
        let source = self.host_path(from)?;
        let dest = self.host_path(to)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &dest)
            .await
            .map_err(|e| map_io(e, from))?;
        debug!(from = %source.display(), to = %dest.display(), "renamed");
        Ok(())
    }

    async fn exists(&self, path: &ResolvedPath) -> VfsResult<bool> {
        let target = self.host_path(path)?;
        Ok(tokio::fs::try_exists(&target).await.unwrap_or(false))
    }

    async fn list(&self, path: &ResolvedPath) -> VfsResult<Vec<String>> {
        let target = self.host_path(path)?;
        let meta = tokio::fs::metadata(&target)
            .await
            .map_err(|e| map_io(e, path))?;
        if !meta.is_dir() {
            return Err(VfsError::NotADirectory(path.to_string()));
        }

        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&target).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve;

    fn at(root: &Path, input: &str) -> ResolvedPath {
        resolve(root, ".", true, input).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let path = at(dir.path(), "nested/deep/file.txt");

        disk.create(&path, b"hello").await.unwrap();
        assert_eq!(disk.read(&path).await.unwrap(), b"hello");
        assert!(dir.path().join("nested/deep/file.txt").is_file());
    }

    #[tokio::test]
    async fn test_create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let path = at(dir.path(), "a.txt");

        disk.create(&path, b"one").await.unwrap();
        let err = disk.create(&path, b"two").await.unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists(_)));
        assert_eq!(disk.read(&path).await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let err = disk.read(&at(dir.path(), "nope")).await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_overwrite_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let path = at(dir.path(), "a.txt");

        let err = disk.overwrite(&path, b"x").await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
        assert!(!dir.path().join("a.txt").exists());

        disk.create(&path, b"long content").await.unwrap();
        disk.overwrite(&path, b"short").await.unwrap();
        assert_eq!(disk.read(&path).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_list_sorted_names() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        disk.create(&at(dir.path(), "b.txt"), b"").await.unwrap();
        disk.create(&at(dir.path(), "a/inner.txt"), b"").await.unwrap();

        let names = disk.list(&ResolvedPath::root()).await.unwrap();
        assert_eq!(names, vec!["a".to_string(), "b.txt".to_string()]);

        let err = disk.list(&at(dir.path(), "b.txt")).await.unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_delete_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        disk.create(&at(dir.path(), "d/x/y.txt"), b"1").await.unwrap();

        disk.delete(&at(dir.path(), "d")).await.unwrap();
        assert!(!disk.exists(&at(dir.path(), "d")).await.unwrap());
    }

    #[tokio::test]
    async fn test_root_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let err = disk.delete(&ResolvedPath::root()).await.unwrap_err();
        assert!(matches!(err, VfsError::PermissionDenied(_)));
        assert!(dir.path().exists());
    }

    #[tokio::test]
    async fn test_escaped_path_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskBackend::new(dir.path());
        let escaped = resolve(dir.path(), ".", false, "../outside.txt").unwrap();

        let err = disk.create(&escaped, b"x").await.unwrap_err();
        assert!(matches!(err, VfsError::PathEscape { .. }));
        assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    }
}
