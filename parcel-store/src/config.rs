//! Parcel store configuration loading
//!
//! Loads configuration from `~/.config/parcel/parcel.toml` (or `PARCEL_STORE_CONFIG` env).

use crate::errors::{ParcelError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for the parcel store
#[derive(Debug, Deserialize, Clone)]
pub struct ParcelConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Create the parcel table on open if it is missing
    #[serde(default = "default_create_schema")]
    pub create_schema: bool,

    /// How long SQLite waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> String {
    dirs::data_dir()
        .map(|d| {
            d.join("parcel")
                .join("parcel.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "parcel.db".to_string())
}

fn default_create_schema() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for ParcelConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            create_schema: default_create_schema(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl ParcelConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "PARCEL_STORE_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "parcel.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `PARCEL_STORE_CONFIG` environment variable
    /// 2. `~/.config/parcel/parcel.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "parcel config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ParcelError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: ParcelConfig = toml::from_str(contents)
            .map_err(|e| ParcelError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .map(|c| c.join("parcel").join(Self::DEFAULT_CONFIG_FILENAME))
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(ParcelError::config("db_path must not be empty"));
        }

        if self.busy_timeout_ms == 0 {
            tracing::warn!("busy_timeout_ms is 0; concurrent writers will fail immediately");
        }

        Ok(())
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> PathBuf {
        let path = &self.db_path;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ParcelConfig::default();
        assert!(cfg.create_schema);
        assert_eq!(cfg.busy_timeout_ms, 5000);
        assert!(cfg.db_path.ends_with("parcel.db"));
    }

    #[test]
    fn test_parse_minimal_config() {
        let cfg = ParcelConfig::parse(r#"db_path = "/tmp/parcels.db""#).expect("should parse");
        assert_eq!(cfg.db_path, "/tmp/parcels.db");
        assert_eq!(cfg.resolved_db_path(), PathBuf::from("/tmp/parcels.db"));
        // Defaults should be applied
        assert!(cfg.create_schema);
        assert_eq!(cfg.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            db_path = "~/parcels/store.db"
            create_schema = false
            busy_timeout_ms = 250
        "#;

        let cfg = ParcelConfig::parse(toml).expect("should parse");
        assert!(!cfg.create_schema);
        assert_eq!(cfg.busy_timeout_ms, 250);
        if let Some(home) = dirs::home_dir() {
            assert_eq!(cfg.resolved_db_path(), home.join("parcels/store.db"));
        }
    }

    #[test]
    fn test_empty_db_path_rejected() {
        let err = ParcelConfig::parse(r#"db_path = "  ""#).expect_err("should reject");
        assert_eq!(err.category(), crate::ErrorCategory::ConfigError);
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = ParcelConfig::parse("busy_timeout_ms = \"soon\"").expect_err("should reject");
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("parcel.toml");
        std::fs::write(&path, "busy_timeout_ms = 10\n").expect("write config");

        let cfg = ParcelConfig::load_from_path(&path).expect("should load");
        assert_eq!(cfg.busy_timeout_ms, 10);

        let missing = ParcelConfig::load_from_path(&dir.path().join("nope.toml"));
        assert!(missing.is_err());
    }
}
