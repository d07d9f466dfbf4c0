//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only fill fields that no
//! config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources, set_nested};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `TROWEL_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TROWEL_ROOT",
        field_path: "fs.root",
    },
    EnvMapping {
        var_name: "TROWEL_ENFORCE_ROOT",
        field_path: "fs.enforce_root",
    },
    EnvMapping {
        var_name: "TROWEL_READ_ONLY",
        field_path: "fs.read_only",
    },
    EnvMapping {
        var_name: "TROWEL_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "TROWEL_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub(crate) fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = matches!(
            sources.get(mapping.field_path),
            Some(ConfigLayer::User | ConfigLayer::Workspace)
        );
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            let path: Vec<&str> = mapping.field_path.split('.').collect();
            set_nested(merged, &path, coerce_to_toml_value(mapping.field_path, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Coerce a string env var value to the TOML type of the target field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if matches!(path, "fs.enforce_root" | "fs.read_only") {
        match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => return toml::Value::Boolean(true),
            "0" | "false" | "no" | "off" => return toml::Value::Boolean(false),
            _ => {},
        }
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
