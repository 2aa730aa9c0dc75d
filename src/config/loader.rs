// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Collects configuration pairs from files, the process environment and
//! command-line overrides.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use crate::error::BringupError;

use super::keys;
use super::ConfigError;

/// File consulted when no `--config` path is given and it exists.
pub const DEFAULT_CONFIG_FILE: &str = "bringup.env";

/// Read key/value pairs from an env-style (`KEY=VALUE`) or TOML file.
///
/// # Errors
/// Returns `ConfigurationInvalid` naming the file when it cannot be read or
/// parsed.
pub fn read_file(path: &Path) -> Result<BTreeMap<String, String>, BringupError> {
    let key = path.display().to_string();
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BringupError::config(&key, format!("cannot read: {}", e)))?;
        return toml_pairs(&content).map_err(|reason| BringupError::config(&key, reason));
    }

    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| BringupError::config(&key, format!("cannot read: {}", e)))?;
    let mut pairs = BTreeMap::new();
    for item in iter {
        let (k, v) = item.map_err(|e| BringupError::config(&key, e.to_string()))?;
        pairs.insert(k.trim().to_ascii_uppercase(), v);
    }
    Ok(pairs)
}

/// Flatten top-level TOML scalars into pairs. Arrays become comma lists.
fn toml_pairs(content: &str) -> Result<BTreeMap<String, String>, String> {
    let table: toml::Table = toml::from_str(content).map_err(|e: toml::de::Error| e.to_string())?;
    let mut pairs = BTreeMap::new();
    for (k, value) in table {
        let rendered = match value {
            toml::Value::String(s) => s,
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            toml::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    toml::Value::Integer(i) => Ok(i.to_string()),
                    _ => Err(format!("'{}' may only contain strings or integers", k)),
                })
                .collect::<Result<Vec<_>, _>>()?
                .join(","),
            toml::Value::Datetime(_) | toml::Value::Table(_) => {
                return Err(format!("'{}' must be a scalar or array", k));
            }
        };
        pairs.insert(k.to_ascii_uppercase(), rendered);
    }
    Ok(pairs)
}

/// Pick the documented keys out of an environment snapshot.
///
/// Entries that are not valid UTF-8 are skipped; a documented key with such a
/// value is logged and treated as unset.
pub fn environment_pairs<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut pairs = BTreeMap::new();
    for (k, v) in vars {
        let Ok(key) = k.into_string() else {
            continue;
        };
        if keys::lookup(&key).is_none() {
            continue;
        }
        match v.into_string() {
            Ok(value) => {
                pairs.insert(key, value);
            }
            Err(_) => tracing::warn!(key = %key, "ignoring environment value that is not valid UTF-8"),
        }
    }
    pairs
}

/// Merge sources, later ones winning.
pub fn merge(sources: impl IntoIterator<Item = BTreeMap<String, String>>) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for source in sources {
        merged.extend(source);
    }
    merged
}

/// Gather pairs for this invocation: config file, then environment, then
/// explicit overrides.
///
/// # Errors
/// Returns the file problem, or every malformed value, as a [`ConfigError`].
pub fn gather(
    path: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<BTreeMap<String, String>, ConfigError> {
    let file_pairs = match path {
        Some(p) => read_file(p).map_err(|e| ConfigError { issues: vec![e] })?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            read_file(Path::new(DEFAULT_CONFIG_FILE)).map_err(|e| ConfigError { issues: vec![e] })?
        }
        None => BTreeMap::new(),
    };

    let override_pairs = overrides
        .iter()
        .map(|(k, v)| (k.to_ascii_uppercase(), v.clone()))
        .collect();

    Ok(merge([
        file_pairs,
        environment_pairs(std::env::vars_os()),
        override_pairs,
    ]))
}
