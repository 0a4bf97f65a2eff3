//! Settings types and loading for trunkflight.
//!
//! The main entry point is [`TrunkflightConfig`]. Values are layered with
//! figment, later layers winning:
//!
//! 1. built-in defaults,
//! 2. `<data dir>/config.yaml`,
//! 3. `TRUNKFLIGHT_*` environment variables (e.g. `TRUNKFLIGHT_COMMIT_LIMIT=20`).
//!
//! Configuration is loaded with [`load_config`] and saved with [`save_config`].

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_dir::{CONFIG_FILE_NAME, default_db_path};

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "TRUNKFLIGHT_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform's local data folder could not be determined.
    #[error("cannot determine the local application data directory for this platform")]
    DataDirUnavailable,

    /// A file or directory could not be read or created.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Merging or extracting the layered settings failed.
    #[error("failed to load settings: {0}")]
    Figment(#[from] figment::Error),

    /// The settings could not be serialized to YAML.
    #[error("failed to write settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// Application settings, corresponding to `<data dir>/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkflightConfig {
    /// Catalog database path. Defaults to `<data dir>/merviche.trunkflight.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Number of commits listed per branch.
    pub commit_limit: usize,

    /// Timeout of the reachability probe run before a fetch.
    pub probe_timeout_ms: u64,

    /// Name prefix of sandbox directories created under the temp dir.
    pub sandbox_prefix: String,

    /// `tracing` filter directive used when neither `-v` nor `RUST_LOG` is given.
    pub log_filter: String,
}

impl Default for TrunkflightConfig {
    fn default() -> Self {
        Self {
            database: None,
            commit_limit: 10,
            probe_timeout_ms: 1000,
            sandbox_prefix: "merviche.trunkflight.".to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

impl TrunkflightConfig {
    /// Defaults merged with the settings file in `data_dir`.
    pub fn file_figment(data_dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(data_dir.join(CONFIG_FILE_NAME)))
    }

    /// All layers, including `TRUNKFLIGHT_*` environment overrides.
    pub fn figment(data_dir: &Path) -> Figment {
        Self::file_figment(data_dir).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extracts and validates settings from a figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// The catalog database path, resolved against `data_dir`.
    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        match &self.database {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => data_dir.join(p),
            None => default_db_path(data_dir),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.commit_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "commit_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe_timeout_ms".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load settings for the given data directory.
///
/// A missing or empty `config.yaml` yields the defaults (plus any
/// environment overrides).
///
/// # Errors
///
/// Returns [`ConfigError::Figment`] if a layer contains invalid values, or
/// [`ConfigError::InvalidValue`] if a value is out of range.
pub fn load_config(data_dir: &Path) -> Result<TrunkflightConfig> {
    TrunkflightConfig::from_figment(&TrunkflightConfig::figment(data_dir))
}

/// Save settings to `config.yaml` inside `data_dir`.
///
/// The directory is created if it does not exist.
pub fn save_config(data_dir: &Path, config: &TrunkflightConfig) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(data_dir.join(CONFIG_FILE_NAME), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn load_file_only(dir: &Path) -> Result<TrunkflightConfig> {
        TrunkflightConfig::from_figment(&TrunkflightConfig::file_figment(dir))
    }

    #[test]
    fn defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_file_only(dir.path()).unwrap();
        assert_eq!(cfg, TrunkflightConfig::default());
        assert_eq!(cfg.commit_limit, 10);
        assert_eq!(cfg.probe_timeout_ms, 1000);
        assert_eq!(cfg.sandbox_prefix, "merviche.trunkflight.");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "commit_limit: 25\n").unwrap();
        let cfg = load_file_only(dir.path()).unwrap();
        assert_eq!(cfg.commit_limit, 25);
        assert_eq!(cfg.log_filter, "warn");
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrunkflightConfig {
            database: Some(PathBuf::from("catalog.db")),
            commit_limit: 3,
            sandbox_prefix: "tf-".into(),
            ..TrunkflightConfig::default()
        };
        save_config(dir.path(), &cfg).unwrap();
        assert_eq!(load_file_only(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn zero_commit_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "commit_limit: 0\n").unwrap();
        let err = load_file_only(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "commit_limit"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "commit_limit: [oops\n").unwrap();
        assert!(matches!(
            load_file_only(dir.path()).unwrap_err(),
            ConfigError::Figment(_)
        ));
    }

    #[test]
    fn db_path_resolution() {
        let data = Path::new("/data");
        let mut cfg = TrunkflightConfig::default();
        assert_eq!(cfg.db_path(data), data.join("merviche.trunkflight.db"));

        cfg.database = Some(PathBuf::from("other.db"));
        assert_eq!(cfg.db_path(data), data.join("other.db"));

        let abs = std::env::temp_dir().join("abs.db");
        cfg.database = Some(abs.clone());
        assert_eq!(cfg.db_path(data), abs);
    }
}
