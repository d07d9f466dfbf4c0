//! Trowel Telemetry - logging setup for Trowel tools.
//!
//! The library crates only emit `tracing` events; this crate installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use trowel_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), trowel_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("trowel_vfs=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod config;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
