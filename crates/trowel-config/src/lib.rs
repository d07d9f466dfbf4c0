//! Trowel Config - layered configuration for the filesystem facade.
//!
//! Values are resolved from embedded defaults, the user's
//! `~/.trowel/config.toml`, the workspace's `.trowel/config.toml`, and
//! finally `TROWEL_*` environment variables for anything no file set.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! # fn main() -> trowel_config::ConfigResult<()> {
//! let config = trowel_config::Config::load(Some(Path::new("/srv/project")))?;
//! println!("read only: {}", config.fs.read_only);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod env;
mod error;
mod loader;
mod merge;
mod show;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::{ConfigLayer, FieldSources};
pub use show::ResolvedConfig;
pub use types::{Config, FsSection, LoggingSection};

use std::path::Path;

impl Config {
    /// Load the layered configuration for `workspace_root`.
    ///
    /// # Errors
    ///
    /// See [`Config::load_resolved`].
    pub fn load(workspace_root: Option<&Path>) -> ConfigResult<Self> {
        Self::load_resolved(workspace_root, None).map(|resolved| resolved.config)
    }

    /// Load the layered configuration and keep track of where each value
    /// came from. `home_override` replaces the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is unreadable, oversized
    /// or malformed, or if the result fails validation.
    pub fn load_resolved(
        workspace_root: Option<&Path>,
        home_override: Option<&Path>,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, home_override)
    }

    /// Load a single config file without layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, unreadable or
    /// invalid.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::ValidationError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
