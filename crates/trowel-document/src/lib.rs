//! Trowel Document - typed structured files.
//!
//! A [`Document`] keeps a typed value together with the location it was
//! loaded from. It reads and writes through a [`SandboxedFs`] when one is
//! attached (so dry runs and root enforcement apply) and through the host
//! filesystem otherwise.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trowel_document::{DependencyKind, PackageJsonFile};
//! use trowel_vfs::SandboxedFs;
//!
//! # async fn demo() -> trowel_vfs::VfsResult<()> {
//! let fs = Arc::new(SandboxedFs::new("/srv/app", true)?);
//! let mut pkg = PackageJsonFile::at("package.json").with_fs(fs);
//! pkg.load().await?;
//! pkg.set_dependency(DependencyKind::Dev, "typescript", "^5.4.0");
//! pkg.save().await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod document;
mod package_json;
mod tsconfig;

pub use document::{Document, DocumentPath};
pub use package_json::{DependencyKind, PACKAGE_JSON, PackageJson, PackageJsonFile};
pub use tsconfig::{TSCONFIG_JSON, TsConfigJson, TsConfigJsonFile, TsConfigReference};
pub use trowel_vfs::Format;
