use crate::errors::ConfigError;
use crate::report::Delimiter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SUMMARY: &str = "bench_summary.csv";
pub const DEFAULT_LOG: &str = "bench_run.log";
pub const DEFAULT_LOCATION: &str = "US";
pub const DEFAULT_BQ: &str = "bq";

/// Optional `qbench.yaml`. Every field may be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub summary: Option<PathBuf>,
    pub log: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub location: Option<String>,
    pub project_id: Option<String>,
    pub bq_path: Option<PathBuf>,
    pub delimiter: Option<String>,
}

impl SettingsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError(format!("failed to read settings {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&raw)
            .map_err(|e| ConfigError(format!("failed to parse settings YAML: {}", e)))
    }

    /// Loads `path` if it exists; a missing file yields the defaults.
    pub fn load_if_exists(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Fields set in `over` win.
    pub fn merge(self, over: SettingsFile) -> SettingsFile {
        SettingsFile {
            summary: over.summary.or(self.summary),
            log: over.log.or(self.log),
            json: over.json.or(self.json),
            catalog: over.catalog.or(self.catalog),
            location: over.location.or(self.location),
            project_id: over.project_id.or(self.project_id),
            bq_path: over.bq_path.or(self.bq_path),
            delimiter: over.delimiter.or(self.delimiter),
        }
    }

    pub fn resolve(self) -> Result<HarnessSettings, ConfigError> {
        let delimiter = match self.delimiter.as_deref() {
            None => Delimiter::default(),
            Some(s) => Delimiter::parse(s)
                .ok_or_else(|| ConfigError(format!("unknown delimiter '{}' (comma|tab)", s)))?,
        };
        let location = self.location.unwrap_or_else(|| DEFAULT_LOCATION.into());
        if location.trim().is_empty() {
            return Err(ConfigError("location must not be empty".into()));
        }
        Ok(HarnessSettings {
            summary_path: self.summary.unwrap_or_else(|| DEFAULT_SUMMARY.into()),
            log_path: self.log.unwrap_or_else(|| DEFAULT_LOG.into()),
            json_path: self.json,
            catalog_path: self.catalog,
            location,
            project_id: self.project_id,
            bq_path: self.bq_path.unwrap_or_else(|| DEFAULT_BQ.into()),
            delimiter,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    pub summary_path: PathBuf,
    pub log_path: PathBuf,
    pub json_path: Option<PathBuf>,
    /// `None` runs the builtin catalog.
    pub catalog_path: Option<PathBuf>,
    pub location: String,
    pub project_id: Option<String>,
    pub bq_path: PathBuf,
    pub delimiter: Delimiter,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            summary_path: DEFAULT_SUMMARY.into(),
            log_path: DEFAULT_LOG.into(),
            json_path: None,
            catalog_path: None,
            location: DEFAULT_LOCATION.into(),
            project_id: None,
            bq_path: DEFAULT_BQ.into(),
            delimiter: Delimiter::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = HarnessSettings::default();
        assert_eq!(s.summary_path, PathBuf::from("bench_summary.csv"));
        assert_eq!(s.log_path, PathBuf::from("bench_run.log"));
        assert_eq!(s.location, "US");
        assert_eq!(s.delimiter, Delimiter::Comma);
        assert!(s.catalog_path.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("qbench.yaml");
        std::fs::write(&p, "location: EU\ndelimiter: tab\nsummary: out/s.tsv\n").unwrap();

        let file = SettingsFile::load_if_exists(&p).unwrap();
        let cli = SettingsFile {
            location: Some("asia-northeast1".into()),
            ..Default::default()
        };
        let s = file.merge(cli).resolve().unwrap();
        assert_eq!(s.location, "asia-northeast1");
        assert_eq!(s.delimiter, Delimiter::Tab);
        assert_eq!(s.summary_path, PathBuf::from("out/s.tsv"));
    }

    #[test]
    fn test_rejects_unknown_keys_and_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("qbench.yaml");
        std::fs::write(&p, "retries: 3\n").unwrap();
        assert!(SettingsFile::load(&p).is_err());

        let bad = SettingsFile {
            delimiter: Some(";".into()),
            ..Default::default()
        };
        assert!(bad.resolve().is_err());
        assert!(SettingsFile::load_if_exists(&dir.path().join("missing.yaml")).is_ok());
    }
}
