// ⚙️ Configuration - optional TOML file, every field defaulted
//
// Example `records.toml`:
//
//   data_file = "data/records.json"
//   storage = "json"            # or "sqlite"
//   at_risk_threshold = 7.0
//   top_n = 10
//   seed = 2025
//   sqlite_history = 20         # snapshots kept by the sqlite store

use crate::error::{RecordsError, Result};
use crate::seed::DEFAULT_SEED;
use crate::store::DEFAULT_HISTORY;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Json,
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StorageKind::Json),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(RecordsError::Config {
                message: format!("unknown storage '{}', expected json or sqlite", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Snapshot file (JSON document or SQLite database)
    pub data_file: PathBuf,

    pub storage: StorageKind,

    /// Default cut-off for `report at-risk`, within [0, 10]
    pub at_risk_threshold: f64,

    /// Default row count for `report top`
    pub top_n: usize,

    /// Default seed for `seed`
    pub seed: u64,

    /// Snapshots kept by the SQLite store
    pub sqlite_history: usize,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        RecordsConfig {
            data_file: PathBuf::from("records.json"),
            storage: StorageKind::Json,
            at_risk_threshold: 7.0,
            top_n: 10,
            seed: DEFAULT_SEED,
            sqlite_history: DEFAULT_HISTORY,
        }
    }
}

impl RecordsConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RecordsConfig = toml::from_str(content).map_err(|e| RecordsError::Config {
            message: format!("failed to parse TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.at_risk_threshold) {
            return Err(RecordsError::Config {
                message: format!(
                    "at_risk_threshold must be within [0, 10], got {}",
                    self.at_risk_threshold
                ),
            });
        }
        if self.sqlite_history == 0 {
            return Err(RecordsError::Config {
                message: "sqlite_history must be at least 1".to_string(),
            });
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(RecordsError::Config {
                message: "data_file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The risk threshold as an exact decimal, rounded to 2 places.
    pub fn risk_threshold(&self) -> Result<Decimal> {
        Decimal::try_from(self.at_risk_threshold)
            .map(crate::ledger::round2)
            .map_err(|e| RecordsError::Config {
                message: format!("invalid at_risk_threshold: {}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = RecordsConfig::default();
        assert_eq!(config.storage, StorageKind::Json);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.risk_threshold().unwrap(), dec!(7));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RecordsConfig::from_toml_str(
            r#"
            storage = "sqlite"
            data_file = "data/records.db"
            at_risk_threshold = 6.5
            "#,
        )
        .unwrap();

        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.data_file, PathBuf::from("data/records.db"));
        assert_eq!(config.risk_threshold().unwrap(), dec!(6.5));
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.sqlite_history, DEFAULT_HISTORY);
    }

    #[test]
    fn test_zero_history_rejected() {
        let err = RecordsConfig::from_toml_str("sqlite_history = 0").unwrap_err();
        assert!(matches!(err, RecordsError::Config { .. }));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = RecordsConfig::from_toml_str("at_risk_threshold = 11.0").unwrap_err();
        assert!(matches!(err, RecordsError::Config { .. }));
    }

    #[test]
    fn test_storage_from_str() {
        assert_eq!("SQLite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert!("csv".parse::<StorageKind>().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.toml");
        std::fs::write(&path, "top_n = 3\n").unwrap();

        let config = RecordsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(RecordsConfig::load(None).unwrap(), RecordsConfig::default());
    }
}
