//! Configuration management
//!
//! Optional settings.json in the tally directory:
//! ```json
//! {
//!   "csv": {
//!     "columns": { "transactionDate": "거래일시", "description": "적요", ... },
//!     "timestampFormat": "%Y-%m-%d %H:%M:%S"
//!   },
//!   "records": { "defaultPageSize": 20, "maxPageSize": 500 },
//!   "limits": { "maxFileSizeBytes": 10485760 },
//!   "databaseFile": "tally.duckdb"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_DATABASE_FILE: &str = "tally.duckdb";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsFile {
    csv: CsvSettings,
    records: RecordSettings,
    limits: LimitSettings,
    database_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CsvSettings {
    columns: ColumnMappings,
    timestamp_format: String,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            columns: ColumnMappings::default(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RecordSettings {
    default_page_size: u32,
    max_page_size: u32,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LimitSettings {
    max_file_size_bytes: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Header names of the bank export columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMappings {
    pub transaction_date: String,
    pub description: String,
    pub deposit: String,
    pub withdrawal: String,
    pub balance: String,
    pub branch: String,
}

impl Default for ColumnMappings {
    fn default() -> Self {
        Self {
            transaction_date: "거래일시".to_string(),
            description: "적요".to_string(),
            deposit: "입금액".to_string(),
            withdrawal: "출금액".to_string(),
            balance: "거래후잔액".to_string(),
            branch: "거래점".to_string(),
        }
    }
}

/// Tally configuration (flattened view of settings)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub columns: ColumnMappings,
    pub timestamp_format: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_file_size_bytes: u64,
    pub database_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default(), None)
    }
}

impl Config {
    /// Load config from the tally directory
    ///
    /// The database file can be overridden with `TALLY_DATABASE`.
    pub fn load(tally_dir: &Path) -> Result<Self> {
        let settings_path = tally_dir.join("settings.json");

        let raw = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            Self::parse_settings(&content)?
        } else {
            SettingsFile::default()
        };

        let database_override = std::env::var("TALLY_DATABASE")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self::from_settings(raw, database_override))
    }

    /// Settings that are not JSON at all are an error; JSON of the wrong
    /// shape falls back to defaults.
    fn parse_settings(content: &str) -> Result<SettingsFile> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("settings.json is not valid JSON: {}", e)))?;

        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring malformed settings.json, using defaults");
            SettingsFile::default()
        }))
    }

    fn from_settings(raw: SettingsFile, database_override: Option<String>) -> Self {
        let max_page_size = raw.records.max_page_size.max(1);
        Self {
            columns: raw.csv.columns,
            timestamp_format: raw.csv.timestamp_format,
            default_page_size: raw.records.default_page_size.clamp(1, max_page_size),
            max_page_size,
            max_file_size_bytes: raw.limits.max_file_size_bytes,
            database_file: database_override
                .or(raw.database_file)
                .unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string()),
        }
    }

    pub fn database_path(&self, tally_dir: &Path) -> PathBuf {
        tally_dir.join(&self.database_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let config = Config::default();
        assert_eq!(config.columns.description, "적요");
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 500);
        assert_eq!(config.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.database_file, "tally.duckdb");
    }

    #[test]
    fn test_partial_settings_keep_other_defaults() {
        let raw = Config::parse_settings(
            r#"{"csv": {"columns": {"description": "Memo"}}, "records": {"maxPageSize": 50}}"#,
        )
        .unwrap();
        let config = Config::from_settings(raw, None);
        assert_eq!(config.columns.description, "Memo");
        assert_eq!(config.columns.balance, "거래후잔액");
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.default_page_size, 20);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = Config::parse_settings("{nope").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_wrong_shape_falls_back_to_defaults() {
        let raw = Config::parse_settings(r#"{"records": {"maxPageSize": "lots"}}"#).unwrap();
        assert_eq!(Config::from_settings(raw, None), Config::default());
    }

    #[test]
    fn test_database_override_wins() {
        let raw = Config::parse_settings(r#"{"databaseFile": "ledger.duckdb"}"#).unwrap();
        let config = Config::from_settings(raw.clone(), None);
        assert_eq!(config.database_file, "ledger.duckdb");

        let overridden = Config::from_settings(raw, Some("other.duckdb".to_string()));
        assert_eq!(overridden.database_file, "other.duckdb");
    }

    #[test]
    fn test_load_reads_settings_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"csv": {"timestampFormat": "%Y/%m/%d %H:%M"}}"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.timestamp_format, "%Y/%m/%d %H:%M");
    }
}
