//! Process-wide catalog configuration.
//!
//! # Responsibility
//! - Load data-source and logging settings from TOML and environment.
//! - Hand immutable settings to the connection provider and logger.
//!
//! # Invariants
//! - Environment variables override file values.
//! - Configuration is never mutated after load.

use crate::db::DbConfig;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "MOVIES_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "MOVIES_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "MOVIES_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MOVIES_LOG_DIR";

const DEFAULT_DB_PATH: &str = "movies.db";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    /// `None` keeps the build-mode default from [`crate::default_log_level`].
    pub log_level: Option<String>,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Parses TOML text; missing keys fall back to defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Reads a TOML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text, path)?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_BUSY_TIMEOUT_MS,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(value);
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        Ok(self)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogConfig, ConfigError, ENV_BUSY_TIMEOUT_MS, ENV_DB_PATH};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn toml_fills_missing_keys_with_defaults() {
        let config =
            CatalogConfig::from_toml_str("database_path = \"/tmp/catalog.db\"", Path::new("x"))
                .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/catalog.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = CatalogConfig::from_toml_str("connection_string = \"x\"", Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env = HashMap::from([
            (ENV_DB_PATH, "/data/override.db"),
            (ENV_BUSY_TIMEOUT_MS, "250"),
        ]);
        let config = CatalogConfig::default()
            .with_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        let db = config.db_config();
        assert_eq!(db.path, PathBuf::from("/data/override.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn non_numeric_busy_timeout_is_rejected() {
        let err = CatalogConfig::default()
            .with_overrides(|key| (key == ENV_BUSY_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
