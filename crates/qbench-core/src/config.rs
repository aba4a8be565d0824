use crate::errors::ConfigError;
use crate::model::Catalog;
use std::collections::HashSet;
use std::path::Path;

pub mod settings;

pub const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// The catalog shipped with the binary: five baseline/optimized query pairs
/// against the public Ethereum dataset.
pub const BUILTIN_CATALOG: &str = include_str!("../data/catalog.yaml");

pub fn builtin_catalog() -> Result<Catalog, ConfigError> {
    parse_catalog(BUILTIN_CATALOG, "<builtin>", true)
}

pub fn load_catalog(path: &Path, strict: bool) -> Result<Catalog, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read catalog {}: {}", path.display(), e)))?;
    parse_catalog(&raw, &path.display().to_string(), strict)
}

pub fn parse_catalog(raw: &str, origin: &str, strict: bool) -> Result<Catalog, ConfigError> {
    let mut ignored_keys = HashSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);

    let cat: Catalog = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse catalog YAML ({}): {}", origin, e)))?;

    // YAML anchors live under `definitions` or `x-` keys.
    let meaningful: Vec<_> = ignored_keys
        .iter()
        .filter(|k| *k != "definitions" && !k.starts_with('_') && !k.starts_with("x-"))
        .cloned()
        .collect();
    if !meaningful.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown catalog fields: {:?} (file: {})",
                meaningful, origin
            )));
        }
        tracing::warn!(event = "catalog_unknown_fields", fields = ?meaningful, origin = %origin);
    }

    validate_catalog(&cat)?;
    Ok(cat)
}

pub fn validate_catalog(cat: &Catalog) -> Result<(), ConfigError> {
    if cat.version != 0 && cat.version != SUPPORTED_CATALOG_VERSION {
        return Err(ConfigError(format!(
            "unsupported catalog version {} (supported: {})",
            cat.version, SUPPORTED_CATALOG_VERSION
        )));
    }
    if cat.queries.is_empty() {
        return Err(ConfigError("catalog has no queries".into()));
    }

    let mut seen = HashSet::new();
    for (i, q) in cat.queries.iter().enumerate() {
        if q.name.trim().is_empty() {
            return Err(ConfigError(format!("query #{} has an empty name", i + 1)));
        }
        if q.sql.trim().is_empty() {
            return Err(ConfigError(format!("query '{}' has empty sql", q.name)));
        }
        if !seen.insert(q.name.as_str()) {
            return Err(ConfigError(format!("duplicate query name '{}'", q.name)));
        }
    }
    Ok(())
}
