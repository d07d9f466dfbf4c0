//! `tsconfig.json` compiler configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Document;

/// Conventional compiler configuration file name.
pub const TSCONFIG_JSON: &str = "tsconfig.json";

/// A `tsconfig.json` document. Comments in the source are dropped on save.
pub type TsConfigJsonFile = Document<TsConfigJson>;

/// A project reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsConfigReference {
    /// Path to the referenced project.
    pub path: String,
}

/// Typed view of a `tsconfig.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfigJson {
    /// Base configuration this one extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Raw compiler options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub compiler_options: Map<String, Value>,
    /// Explicit file list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Include globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Exclude globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Project references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<TsConfigReference>,
    /// Every other field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TsConfigJson {
    /// A compiler option by its JSON name.
    #[must_use]
    pub fn compiler_option(&self, name: &str) -> Option<&Value> {
        self.compiler_options.get(name)
    }

    /// Set a compiler option, returning the previous value.
    pub fn set_compiler_option(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.compiler_options.insert(name.into(), value.into())
    }

    /// Add a project reference unless one with the same path exists.
    pub fn add_reference(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.references.iter().any(|r| r.path == path) {
            self.references.push(TsConfigReference { path });
        }
    }
}
