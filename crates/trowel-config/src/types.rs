//! Configuration types.
//!
//! Every section derives `Deserialize` with `#[serde(default)]` so a partial
//! file only overrides the fields it names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete Trowel configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sandboxed filesystem settings.
    pub fs: FsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// FsSection
// ---------------------------------------------------------------------------

/// Root boundary and access settings for the filesystem facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsSection {
    /// Absolute root directory. `None` uses the process working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Treat any path leaving the root as an error, even in dry runs.
    pub enforce_root: bool,
    /// Refuse every mutating operation.
    pub read_only: bool,
}

impl Default for FsSection {
    fn default() -> Self {
        Self {
            root: None,
            enforce_root: true,
            read_only: false,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["trowel_vfs=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[fs]\nread_only = true\n").unwrap();
        assert!(config.fs.read_only);
        assert!(config.fs.enforce_root);
        assert_eq!(config.logging, LoggingSection::default());
    }

    #[test]
    fn test_root_is_omitted_when_unset() {
        let text = toml::to_string(&Config::default()).unwrap();
        assert!(!text.contains("root ="));
        assert!(text.contains("enforce_root = true"));
    }
}
