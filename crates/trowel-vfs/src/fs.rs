use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::path::{self, normalize};
use crate::tree::{VirtualTree, VirtualTreeBackend};
use crate::{
    BackendKind, DiskBackend, Format, ResolvedPath, StorageBackend, VfsError, VfsResult,
};

/// Whether a facade accepts mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Reads and writes are allowed.
    #[default]
    ReadWrite,
    /// Every mutating operation fails with [`VfsError::ReadOnly`].
    ReadOnly,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWrite => write!(f, "read-write"),
            Self::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// A filesystem facade confined to a root directory.
///
/// Every path argument is resolved against the current working directory
/// and checked against the root boundary before it reaches storage. Storage
/// is the host disk unless a [`VirtualTree`] is attached, in which case all
/// operations are recorded in the tree instead.
///
/// With `enforce_root` unset, a path escaping the root is tolerated only
/// while a tree is attached (it is clamped at the tree's root). The disk
/// backend always enforces containment.
///
/// The backend is picked once per operation, so a precondition check and
/// the mutation that follows it always hit the same storage. The two are
/// still separate steps: concurrent operations on the same path can both
/// pass their checks, and a failed mutation is not rolled back.
pub struct SandboxedFs {
    root: PathBuf,
    enforce_root: bool,
    mode: AccessMode,
    cwd: RwLock<ResolvedPath>,
    disk: Arc<DiskBackend>,
    tree: RwLock<Option<Arc<VirtualTreeBackend>>>,
}

impl SandboxedFs {
    /// Create a facade rooted at `root`, starting at the root directory.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::InvalidRoot`] if `root` is not absolute.
    pub fn new(root: impl AsRef<Path>, enforce_root: bool) -> VfsResult<Self> {
        let root = root.as_ref();
        if !root.is_absolute() {
            return Err(VfsError::InvalidRoot(format!(
                "root must be absolute: {}",
                root.display()
            )));
        }
        let root = PathBuf::from(normalize(&root.to_string_lossy()));

        Ok(Self {
            disk: Arc::new(DiskBackend::new(root.clone())),
            root,
            enforce_root,
            mode: AccessMode::default(),
            cwd: RwLock::new(ResolvedPath::root()),
            tree: RwLock::new(None),
        })
    }

    /// Create a facade rooted at the process working directory.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Io`] if the working directory is unavailable.
    pub fn current_dir(enforce_root: bool) -> VfsResult<Self> {
        let cwd = std::env::current_dir()?;
        Self::new(cwd, enforce_root)
    }

    /// Set the access mode.
    #[must_use]
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Start with `tree` attached.
    #[must_use]
    pub fn with_tree(mut self, tree: Arc<dyn VirtualTree>) -> Self {
        *self.tree.get_mut() = Some(Arc::new(VirtualTreeBackend::new(tree)));
        self
    }

    /// The root boundary.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current working directory, relative to the root.
    pub async fn cwd(&self) -> ResolvedPath {
        self.cwd.read().await.clone()
    }

    /// Whether escaping the root is always an error.
    #[must_use]
    pub fn enforces_root(&self) -> bool {
        self.enforce_root
    }

    /// The access mode.
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether operations currently go to a virtual tree.
    pub async fn is_virtual(&self) -> bool {
        self.tree.read().await.is_some()
    }

    /// Route all following operations to `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::TreeAlreadyAttached`] if a tree is already attached.
    pub async fn attach_tree(&self, tree: Arc<dyn VirtualTree>) -> VfsResult<()> {
        let mut slot = self.tree.write().await;
        if slot.is_some() {
            return Err(VfsError::TreeAlreadyAttached);
        }
        *slot = Some(Arc::new(VirtualTreeBackend::new(tree)));
        info!(root = %self.root.display(), "virtual tree attached");
        Ok(())
    }

    /// Detach the current tree, returning it. Disk behaviour resumes.
    pub async fn detach_tree(&self) -> Option<Arc<dyn VirtualTree>> {
        let detached = self.tree.write().await.take();
        if detached.is_some() {
            info!(root = %self.root.display(), "virtual tree detached");
        }
        detached.map(|backend| Arc::clone(backend.tree()))
    }

    async fn backend(&self) -> Arc<dyn StorageBackend> {
        match self.tree.read().await.as_ref() {
            Some(tree) => Arc::clone(tree) as Arc<dyn StorageBackend>,
            None => Arc::clone(&self.disk) as Arc<dyn StorageBackend>,
        }
    }

    fn resolve_with(
        &self,
        cwd: &ResolvedPath,
        kind: BackendKind,
        input: &str,
    ) -> VfsResult<ResolvedPath> {
        let enforce = self.enforce_root || kind == BackendKind::Disk;
        let resolved = path::resolve(&self.root, cwd.as_str(), enforce, input)?;
        if resolved.escapes_root() {
            warn!(
                input,
                resolved = %resolved,
                root = %self.root.display(),
                "path escapes root, re-rooting inside virtual tree"
            );
        }
        debug!(input, resolved = %resolved, cwd = %cwd, "resolved path");
        Ok(resolved)
    }

    async fn target(&self, input: &str) -> VfsResult<(Arc<dyn StorageBackend>, ResolvedPath)> {
        let backend = self.backend().await;
        let cwd = self.cwd.read().await.clone();
        let resolved = self.resolve_with(&cwd, backend.kind(), input)?;
        Ok((backend, resolved))
    }

    fn check_writable(&self, action: &str, input: &str) -> VfsResult<()> {
        match self.mode {
            AccessMode::ReadWrite => Ok(()),
            AccessMode::ReadOnly => Err(VfsError::ReadOnly(format!("{action} {input}"))),
        }
    }

    /// Resolve `input` the way the next operation would.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::PathEscape`] if the path leaves the root and
    /// that is not tolerated.
    pub async fn resolve(&self, input: &str) -> VfsResult<ResolvedPath> {
        self.target(input).await.map(|(_, resolved)| resolved)
    }

    /// Read a file. Returns `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Fails on a path escape or any storage error other than absence.
    pub async fn read(&self, input: &str) -> VfsResult<Option<Vec<u8>>> {
        let (backend, resolved) = self.target(input).await?;
        match backend.read(&resolved).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read a file as text. Invalid UTF-8 is replaced.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::read`].
    pub async fn read_text(&self, input: &str) -> VfsResult<Option<String>> {
        Ok(self
            .read(input)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Read and decode a JSON file. Comments are tolerated.
    ///
    /// Returns `None` when the file is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Parse`] for malformed content, otherwise as
    /// [`SandboxedFs::read`].
    pub async fn read_json<T: DeserializeOwned>(&self, input: &str) -> VfsResult<Option<T>> {
        self.read_structured(input, Format::Json).await
    }

    /// Read and decode a YAML file.
    ///
    /// Returns `None` when the file is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Parse`] for malformed content, otherwise as
    /// [`SandboxedFs::read`].
    pub async fn read_yaml<T: DeserializeOwned>(&self, input: &str) -> VfsResult<Option<T>> {
        self.read_structured(input, Format::Yaml).await
    }

    /// Read and decode `input` in the given format.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::read_json`].
    pub async fn read_structured<T: DeserializeOwned>(
        &self,
        input: &str,
        format: Format,
    ) -> VfsResult<Option<T>> {
        let Some(text) = self.read_text(input).await? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        format.decode(&text, input).map(Some)
    }

    /// Create a new file, creating missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::AlreadyExists`] if something is already at the
    /// path, [`VfsError::ReadOnly`] on a read-only facade.
    pub async fn create(&self, input: &str, content: &[u8]) -> VfsResult<()> {
        self.check_writable("create", input)?;
        let (backend, resolved) = self.target(input).await?;
        if backend.exists(&resolved).await? {
            return Err(VfsError::AlreadyExists(resolved.to_string()));
        }
        backend.create(&resolved, content).await?;
        info!(
            path = %resolved,
            backend = %backend.kind(),
            bytes = content.len(),
            "create"
        );
        Ok(())
    }

    /// Create a new text file.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::create`].
    pub async fn create_text(&self, input: &str, text: &str) -> VfsResult<()> {
        self.create(input, text.as_bytes()).await
    }

    /// Create a new file holding `value` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Encode`] if `value` cannot be serialized,
    /// otherwise as [`SandboxedFs::create`].
    pub async fn create_json<T: Serialize + ?Sized>(
        &self,
        input: &str,
        value: &T,
    ) -> VfsResult<()> {
        let text = Format::Json.encode(value)?;
        self.create(input, text.as_bytes()).await
    }

    /// Create a new file holding `value` as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Encode`] if `value` cannot be serialized,
    /// otherwise as [`SandboxedFs::create`].
    pub async fn create_yaml<T: Serialize + ?Sized>(
        &self,
        input: &str,
        value: &T,
    ) -> VfsResult<()> {
        let text = Format::Yaml.encode(value)?;
        self.create(input, text.as_bytes()).await
    }

    /// Replace the content of an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] if nothing is at the path,
    /// [`VfsError::ReadOnly`] on a read-only facade.
    pub async fn overwrite(&self, input: &str, content: &[u8]) -> VfsResult<()> {
        self.check_writable("overwrite", input)?;
        let (backend, resolved) = self.target(input).await?;
        if !backend.exists(&resolved).await? {
            return Err(VfsError::NotFound(resolved.to_string()));
        }
        backend.overwrite(&resolved, content).await?;
        info!(
            path = %resolved,
            backend = %backend.kind(),
            bytes = content.len(),
            "overwrite"
        );
        Ok(())
    }

    /// Replace an existing file with text.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::overwrite`].
    pub async fn overwrite_text(&self, input: &str, text: &str) -> VfsResult<()> {
        self.overwrite(input, text.as_bytes()).await
    }

    /// Replace an existing file with `value` as JSON.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::create_json`], with the existence rule of
    /// [`SandboxedFs::overwrite`].
    pub async fn overwrite_json<T: Serialize + ?Sized>(
        &self,
        input: &str,
        value: &T,
    ) -> VfsResult<()> {
        let text = Format::Json.encode(value)?;
        self.overwrite(input, text.as_bytes()).await
    }

    /// Replace an existing file with `value` as YAML.
    ///
    /// # Errors
    ///
    /// As [`SandboxedFs::create_yaml`], with the existence rule of
    /// [`SandboxedFs::overwrite`].
    pub async fn overwrite_yaml<T: Serialize + ?Sized>(
        &self,
        input: &str,
        value: &T,
    ) -> VfsResult<()> {
        let text = Format::Yaml.encode(value)?;
        self.overwrite(input, text.as_bytes()).await
    }

    /// Delete a file or directory.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] if nothing is at the path,
    /// [`VfsError::ReadOnly`] on a read-only facade.
    pub async fn delete(&self, input: &str) -> VfsResult<()> {
        self.check_writable("delete", input)?;
        let (backend, resolved) = self.target(input).await?;
        if !backend.exists(&resolved).await? {
            return Err(VfsError::NotFound(resolved.to_string()));
        }
        backend.delete(&resolved).await?;
        info!(path = %resolved, backend = %backend.kind(), "delete");
        Ok(())
    }

    /// Move `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] if `from` is missing,
    /// [`VfsError::AlreadyExists`] if `to` is taken (the source is left
    /// intact), [`VfsError::ReadOnly`] on a read-only facade.
    pub async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        self.check_writable("rename", from)?;
        let backend = self.backend().await;
        let cwd = self.cwd.read().await.clone();
        let source = self.resolve_with(&cwd, backend.kind(), from)?;
        let dest = self.resolve_with(&cwd, backend.kind(), to)?;

        if !backend.exists(&source).await? {
            return Err(VfsError::NotFound(source.to_string()));
        }
        if backend.exists(&dest).await? {
            return Err(VfsError::AlreadyExists(dest.to_string()));
        }
        backend.rename(&source, &dest).await?;
        info!(from = %source, to = %dest, backend = %backend.kind(), "rename");
        Ok(())
    }

    /// Whether anything exists at the path.
    ///
    /// Never fails: a path that cannot be resolved, or a storage error,
    /// reads as absent.
    pub async fn exists(&self, input: &str) -> bool {
        let (backend, resolved) = match self.target(input).await {
            Ok(target) => target,
            Err(e) => {
                debug!(input, error = %e, "exists: path did not resolve");
                return false;
            },
        };
        match backend.exists(&resolved).await {
            Ok(found) => found,
            Err(e) => {
                debug!(path = %resolved, error = %e, "exists: backend error");
                false
            },
        }
    }

    /// Names of the entries inside a directory, sorted.
    ///
    /// Files and sub-directories are not distinguished.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] if the path is missing,
    /// [`VfsError::NotADirectory`] if it is a file.
    pub async fn list(&self, input: &str) -> VfsResult<Vec<String>> {
        let (backend, resolved) = self.target(input).await?;
        if !backend.exists(&resolved).await? {
            return Err(VfsError::NotFound(resolved.to_string()));
        }
        let mut names = backend.list(&resolved).await?;
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Change the working directory. On failure it is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] if the target does not exist, or a
    /// path escape error.
    pub async fn cd(&self, input: &str) -> VfsResult<()> {
        let backend = self.backend().await;
        let mut cwd = self.cwd.write().await;
        let resolved = self.resolve_with(&cwd, backend.kind(), input)?;
        if !backend.exists(&resolved).await? {
            return Err(VfsError::NotFound(resolved.to_string()));
        }
        debug!(from = %cwd.as_str(), to = %resolved, "changed directory");
        *cwd = resolved;
        Ok(())
    }
}

impl fmt::Debug for SandboxedFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cwd = self.cwd.try_read().map(|cwd| cwd.to_string()).ok();
        let is_virtual = self.tree.try_read().map(|tree| tree.is_some()).ok();
        f.debug_struct("SandboxedFs")
            .field("root", &self.root)
            .field("enforce_root", &self.enforce_root)
            .field("mode", &self.mode)
            .field("cwd", &cwd)
            .field("is_virtual", &is_virtual)
            .finish()
    }
}
