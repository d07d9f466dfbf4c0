//! Deep merge of TOML values with restriction enforcement.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from a layer never overrides the layer below.

use std::collections::HashMap;

use tracing::warn;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User-level configuration (`~/.trowel/config.toml`).
    User,
    /// Workspace-level configuration (`{workspace}/.trowel/config.toml`).
    Workspace,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user"),
            Self::Workspace => write!(f, "workspace"),
            Self::Environment => write!(f, "env"),
        }
    }
}

/// Tracks which layer set each field's value.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value. `prefix` is the dotted path of `base` (empty at the top).
pub(crate) fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_key(prefix, key);

                if let Some(base_val) = base_table.get_mut(key) {
                    if overlay_val.is_table() {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    } else {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer.clone());
                    }
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned(), layer.clone());
        },
    }
}

/// Record every leaf path under `val` as set by `layer`.
pub(crate) fn record_leaves(
    val: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_key(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Stop a workspace layer from loosening the filesystem sandbox.
///
/// A project checkout is less trusted than the user's own config: it may
/// turn `enforce_root` or `read_only` on, but not off when the layers
/// below had them on. `baseline` is the merged config before the workspace
/// layer was applied.
pub(crate) fn enforce_restrictions(
    merged: &mut toml::Value,
    baseline: &toml::Value,
    workspace_layer: &toml::Value,
) {
    for field in [["fs", "enforce_root"], ["fs", "read_only"]] {
        enforce_bool_only_true(merged, baseline, workspace_layer, &field);
    }
}

fn enforce_bool_only_true(
    merged: &mut toml::Value,
    baseline: &toml::Value,
    workspace: &toml::Value,
    path: &[&str],
) {
    let was_on = get_nested(baseline, path).and_then(toml::Value::as_bool) == Some(true);
    let turned_off = get_nested(workspace, path).and_then(toml::Value::as_bool) == Some(false);
    if was_on && turned_off {
        warn!(
            field = %path.join("."),
            "workspace config tried to disable a sandbox restriction; keeping it enabled"
        );
        set_nested(merged, path, toml::Value::Boolean(true));
    }
}

/// Look up a value at a nested path.
pub(crate) fn get_nested<'a>(val: &'a toml::Value, path: &[&str]) -> Option<&'a toml::Value> {
    let mut current = val;
    for segment in path {
        current = current.as_table()?.get(*segment)?;
    }
    Some(current)
}

/// Set a value at a nested path, creating intermediate tables as needed.
pub(crate) fn set_nested(val: &mut toml::Value, path: &[&str], new_val: toml::Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut current = val;
    for segment in parents {
        let Some(table) = current.as_table_mut() else {
            warn!(segment, "set_nested: expected a table; skipping");
            return;
        };
        current = table
            .entry((*segment).to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert((*leaf).to_owned(), new_val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    fn bool_at(val: &toml::Value, path: &[&str]) -> Option<bool> {
        get_nested(val, path).and_then(toml::Value::as_bool)
    }

    #[test]
    fn test_merge_records_sources() {
        let mut base = parse("[fs]\nenforce_root = true\nread_only = false\n");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", &ConfigLayer::Defaults, &mut sources);

        let overlay = parse("[fs]\nread_only = true\n[logging]\nlevel = \"debug\"\n");
        deep_merge_tracking(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(get_nested(&base, &["fs", "read_only"]), Some(&toml::Value::Boolean(true)));
        assert_eq!(sources.get("fs.enforce_root"), Some(&ConfigLayer::Defaults));
        assert_eq!(sources.get("fs.read_only"), Some(&ConfigLayer::User));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::User));
    }

    #[test]
    fn test_workspace_cannot_disable_enforcement() {
        let baseline = parse("[fs]\nenforce_root = true\nread_only = true\n");
        let workspace = parse("[fs]\nenforce_root = false\nread_only = false\n");
        let mut merged = parse("[fs]\nenforce_root = false\nread_only = false\n");

        enforce_restrictions(&mut merged, &baseline, &workspace);
        assert_eq!(bool_at(&merged, &["fs", "enforce_root"]), Some(true));
        assert_eq!(bool_at(&merged, &["fs", "read_only"]), Some(true));
    }

    #[test]
    fn test_workspace_may_tighten() {
        let baseline = parse("[fs]\nenforce_root = false\n");
        let workspace = parse("[fs]\nenforce_root = true\n");
        let mut merged = workspace.clone();

        enforce_restrictions(&mut merged, &baseline, &workspace);
        assert_eq!(bool_at(&merged, &["fs", "enforce_root"]), Some(true));
    }

    #[test]
    fn test_set_nested_creates_tables() {
        let mut val = parse("");
        set_nested(&mut val, &["fs", "root"], toml::Value::String("/srv".into()));
        assert_eq!(get_nested(&val, &["fs", "root"]).and_then(toml::Value::as_str), Some("/srv"));
    }
}
