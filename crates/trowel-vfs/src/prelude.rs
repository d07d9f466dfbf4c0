//! Prelude module - commonly used types for convenient import.
//!
//! Use `use trowel_vfs::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust,no_run
//! use trowel_vfs::prelude::*;
//!
//! # async fn demo() -> VfsResult<()> {
//! let fs = SandboxedFs::new("/srv/project", true)?;
//! fs.create_text("notes/todo.md", "- ship it\n").await?;
//! fs.cd("notes").await?;
//! assert!(fs.exists("todo.md").await);
//! # Ok(())
//! # }
//! ```

// Errors
pub use crate::{VfsError, VfsResult};

// Facade
pub use crate::{AccessMode, SandboxedFs};

// Storage
pub use crate::{BackendKind, DiskBackend, StorageBackend};
pub use crate::{TreeDir, VirtualTree, VirtualTreeBackend};

// Paths and formats
pub use crate::{Format, ResolvedPath};
