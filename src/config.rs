use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::{LoadLimits, MAX_ROWS, PROGRESS_INTERVAL};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "csv_visor.json";

/// Viewer settings.  Every field may be omitted from the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Maximum number of data rows read from one file.
    pub max_rows: usize,
    /// Rows between two loader progress updates.
    pub progress_interval: usize,
    /// Explicit location of the `name=id` emitter label file.
    pub reference_file: Option<PathBuf>,
    /// Header substring (case-insensitive) that marks the emitter column.
    pub emitter_keyword: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            progress_interval: PROGRESS_INTERVAL,
            reference_file: None,
            emitter_keyword: "emitter".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load from `explicit` if given (it must exist), otherwise from
    /// [`DEFAULT_CONFIG_FILE`] if present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 {
            bail!("max_rows must be greater than zero");
        }
        if self.progress_interval == 0 {
            bail!("progress_interval must be greater than zero");
        }
        Ok(())
    }

    pub fn load_limits(&self) -> LoadLimits {
        LoadLimits {
            max_rows: self.max_rows,
            progress_interval: self.progress_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_loader_constants() {
        let config = ViewerConfig::default();
        assert_eq!(config.load_limits(), LoadLimits::default());
        assert_eq!(config.emitter_keyword, "emitter");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "max_rows": 10, "reference_file": "labels.txt" }"#).unwrap();

        let config = ViewerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_rows, 10);
        assert_eq!(config.progress_interval, PROGRESS_INTERVAL);
        assert_eq!(config.reference_file, Some(PathBuf::from("labels.txt")));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ViewerConfig::load(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn malformed_or_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bad_json = dir.path().join("bad.json");
        std::fs::write(&bad_json, "{ max_rows: ").unwrap();
        assert!(ViewerConfig::load(Some(&bad_json)).is_err());

        let zero = dir.path().join("zero.json");
        std::fs::write(&zero, r#"{ "progress_interval": 0 }"#).unwrap();
        let err = ViewerConfig::load(Some(&zero)).unwrap_err();
        assert!(err.to_string().contains("progress_interval"));
    }
}
