//! `package.json` manifests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Document;

/// Conventional manifest file name.
pub const PACKAGE_JSON: &str = "package.json";

/// A `package.json` document.
pub type PackageJsonFile = Document<PackageJson>;

/// Which dependency table a package is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// `dependencies`
    Regular,
    /// `devDependencies`
    Dev,
    /// `peerDependencies`
    Peer,
}

impl DependencyKind {
    /// Lookup order used by [`PackageJson::dependency`].
    pub const ALL: [Self; 3] = [Self::Regular, Self::Dev, Self::Peer];

    /// Manifest field holding this table.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Regular => "dependencies",
            Self::Dev => "devDependencies",
            Self::Peer => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Typed view of a `package.json` manifest.
///
/// Fields without a typed counterpart are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    /// Package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Package version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// One-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named scripts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,
    /// Runtime dependencies.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    /// Peer dependencies.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Every other field.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageJson {
    /// The dependency table for `kind`.
    #[must_use]
    pub fn dependencies(&self, kind: DependencyKind) -> &BTreeMap<String, String> {
        match kind {
            DependencyKind::Regular => &self.dependencies,
            DependencyKind::Dev => &self.dev_dependencies,
            DependencyKind::Peer => &self.peer_dependencies,
        }
    }

    fn dependencies_mut(&mut self, kind: DependencyKind) -> &mut BTreeMap<String, String> {
        match kind {
            DependencyKind::Regular => &mut self.dependencies,
            DependencyKind::Dev => &mut self.dev_dependencies,
            DependencyKind::Peer => &mut self.peer_dependencies,
        }
    }

    /// Find `name` in the first table listing it.
    #[must_use]
    pub fn dependency(&self, name: &str) -> Option<(DependencyKind, &str)> {
        DependencyKind::ALL.into_iter().find_map(|kind| {
            self.dependencies(kind)
                .get(name)
                .map(|version| (kind, version.as_str()))
        })
    }

    /// Add or update `name` in the `kind` table, returning the old range.
    pub fn set_dependency(
        &mut self,
        kind: DependencyKind,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Option<String> {
        self.dependencies_mut(kind)
            .insert(name.into(), version.into())
    }

    /// Remove `name` from every table. Returns whether anything was removed.
    pub fn remove_dependency(&mut self, name: &str) -> bool {
        let mut removed = false;
        for kind in DependencyKind::ALL {
            removed |= self.dependencies_mut(kind).remove(name).is_some();
        }
        removed
    }

    /// The command for script `name`.
    #[must_use]
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Add or replace script `name`.
    pub fn set_script(&mut self, name: impl Into<String>, command: impl Into<String>) {
        self.scripts.insert(name.into(), command.into());
    }
}
