//! Trowel Test - Shared test utilities for the Trowel crates.
//!
//! This crate provides a recording in-memory [`MemoryTree`], temporary
//! sandboxes and sample documents that can be used across the workspace
//! as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! trowel-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use trowel_test::prelude::*;
//!
//! #[tokio::test]
//! async fn test_dry_run() {
//!     let sandbox = Sandbox::new();
//!     let tree = sandbox.attach_memory_tree().await;
//!
//!     sandbox.fs.create_text("a.txt", "hi").await.unwrap();
//!
//!     assert_eq!(tree.changes()[0].to_string(), "CREATE /a.txt (2 bytes)");
//!     assert!(sandbox.disk_text("a.txt").is_none());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
