use thiserror::Error;

use crate::codec::Format;

/// Sandboxed filesystem errors.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The resolved path would leave the root boundary.
    #[error("Path '{input}' resolves outside the root boundary: {target}")]
    PathEscape {
        /// The path as supplied by the caller.
        input: String,
        /// The host location the path would have resolved to.
        target: String,
    },

    /// A "must exist" precondition failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A "must not exist" precondition failed.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A document was loaded or saved before a path was set.
    #[error("Document has no path")]
    NoPath,

    /// Stored content could not be decoded.
    #[error("Failed to parse {format} in {path}: {message}")]
    Parse {
        /// Path of the offending content.
        path: String,
        /// Format the content was decoded as.
        format: Format,
        /// Decoder message, including location when available.
        message: String,
    },

    /// A value could not be serialized.
    #[error("Failed to encode {format}: {message}")]
    Encode {
        /// Target format.
        format: Format,
        /// Encoder message.
        message: String,
    },

    /// Native IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The attached virtual tree rejected an operation.
    #[error("Virtual tree error: {0}")]
    Backend(String),

    /// Operation not permitted on this target.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A mutation was attempted on a read-only facade.
    #[error("Filesystem is read-only, refusing to {0}")]
    ReadOnly(String),

    /// A second virtual tree was attached while one is active.
    #[error("A virtual tree is already attached")]
    TreeAlreadyAttached,

    /// The root boundary is unusable.
    #[error("Invalid root boundary: {0}")]
    InvalidRoot(String),
}

impl VfsError {
    /// True for the "absent" family of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Convenience result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;
