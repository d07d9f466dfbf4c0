//! Prelude module - commonly used types for convenient import.
//!
//! Use `use trowel_test::prelude::*;` to import the helpers together with
//! the facade types they work with.

pub use crate::fixtures::*;
pub use crate::harness::*;
pub use crate::mocks::*;

pub use trowel_vfs::{AccessMode, SandboxedFs, VfsError, VirtualTree};
