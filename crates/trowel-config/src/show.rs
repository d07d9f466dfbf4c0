//! Source-annotated rendering of a resolved configuration.

use std::fmt::Write as _;

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Which layer set `field` (a dotted path such as `fs.root`).
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&ConfigLayer> {
        self.field_sources.get(field)
    }

    /// Render the configuration as TOML, each value annotated with the
    /// layer that set it.
    ///
    /// # Errors
    ///
    /// Returns [`toml::ser::Error`] if the configuration cannot be serialized.
    pub fn annotated_toml(&self) -> Result<String, toml::ser::Error> {
        let body = toml::to_string_pretty(&self.config)?;
        let mut output = String::from("# Resolved Trowel configuration\n");

        for (i, path) in self.loaded_files.iter().enumerate() {
            let _ = writeln!(output, "#   {}. {path}", i.saturating_add(1));
        }
        output.push('\n');

        let mut section = String::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                name.clone_into(&mut section);
            }

            let annotation = trimmed
                .split_once('=')
                .map(|(key, _)| format!("{section}.{}", key.trim()))
                .and_then(|field| self.field_sources.get(&field));
            match annotation {
                Some(layer) => {
                    let _ = writeln!(output, "{line}  # [{layer}]");
                },
                None => {
                    output.push_str(line);
                    output.push('\n');
                },
            }
        }

        Ok(output)
    }
}
