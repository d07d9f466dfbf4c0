//! Trowel Virtual File System (VFS).
//!
//! A sandboxed filesystem facade: callers perform path-based reads and
//! writes through [`SandboxedFs`] without knowing whether they land on real
//! disk ([`DiskBackend`]) or in an externally owned, change-recording
//! [`VirtualTree`] used for dry runs. Every path is resolved against a fixed
//! root boundary before it reaches a backend.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// JSON and YAML encoding on top of raw bytes.
pub mod codec;
/// Disk-backed storage.
pub mod disk;
/// Virtual filesystem error types.
pub mod error;
/// The sandboxed facade.
pub mod fs;
/// Path resolution and sandboxing utilities.
pub mod path;
pub mod prelude;
/// Virtual change tree contract and its storage adapter.
pub mod tree;

#[cfg(feature = "config")]
mod config;

pub use codec::Format;
pub use disk::DiskBackend;
pub use error::{VfsError, VfsResult};
pub use fs::{AccessMode, SandboxedFs};
pub use path::ResolvedPath;
pub use tree::{TreeDir, VirtualTree, VirtualTreeBackend};

use async_trait::async_trait;

/// Which kind of storage a backend writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Durable host storage.
    Disk,
    /// A recorded, in-memory change tree.
    VirtualTree,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disk => write!(f, "disk"),
            Self::VirtualTree => write!(f, "virtual-tree"),
        }
    }
}

/// Storage operations a backend must provide.
///
/// Paths arrive already resolved. Backends report absence as
/// [`VfsError::NotFound`] and leave the decision of whether that is fatal to
/// the caller. Preconditions ("must exist", "must not exist") are checked by
/// the facade, not here.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// The kind of storage behind this backend.
    fn kind(&self) -> BackendKind;

    /// Read a whole file.
    async fn read(&self, path: &ResolvedPath) -> VfsResult<Vec<u8>>;

    /// Create a new file, creating missing parent directories.
    async fn create(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()>;

    /// Replace the content of an existing file.
    async fn overwrite(&self, path: &ResolvedPath, content: &[u8]) -> VfsResult<()>;

    /// Remove a file or directory.
    async fn delete(&self, path: &ResolvedPath) -> VfsResult<()>;

    /// Move `from` to `to`.
    async fn rename(&self, from: &ResolvedPath, to: &ResolvedPath) -> VfsResult<()>;

    /// Check if a path exists.
    async fn exists(&self, path: &ResolvedPath) -> VfsResult<bool>;

    /// Names of the entries directly inside a directory.
    async fn list(&self, path: &ResolvedPath) -> VfsResult<Vec<String>>;
}
