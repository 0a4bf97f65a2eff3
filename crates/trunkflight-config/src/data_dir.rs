//! Resolution of the per-user application data directory.
//!
//! Mirrors live under `<data dir>/src/...` and the catalog database sits
//! next to them. The base folder is the platform's local data directory:
//! `%LOCALAPPDATA%` on Windows, `$XDG_DATA_HOME` or `~/.local/share` on
//! Linux, `~/Library/Application Support` on macOS.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{ConfigError, Result};

/// Vendor/app subdirectory appended to the platform data directory.
pub const APP_DIR_NAME: &str = "merviche.trunkflight";

/// Environment variable that replaces the platform data directory.
pub const DATA_DIR_ENV: &str = "TRUNKFLIGHT_DATA_DIR";

/// File name of the catalog database inside the data directory.
pub const DB_FILE_NAME: &str = "merviche.trunkflight.db";

/// File name of the settings file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Returns the application data directory, creating it if absent.
///
/// `TRUNKFLIGHT_DATA_DIR` takes precedence over the platform default.
///
/// # Errors
///
/// Returns [`ConfigError::DataDirUnavailable`] if the platform base folder
/// cannot be determined, or [`ConfigError::Io`] if creation fails.
pub fn user_data_dir() -> Result<PathBuf> {
    resolve_data_dir(None)
}

/// Like [`user_data_dir`], but an explicit `override_dir` wins over both the
/// environment and the platform default.
///
/// Relative overrides are made absolute against the current directory.
pub fn resolve_data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let env_dir = std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let dir = match override_dir.map(Path::to_path_buf).or(env_dir) {
        Some(dir) => std::path::absolute(&dir)?,
        None => dirs::data_local_dir()
            .ok_or(ConfigError::DataDirUnavailable)?
            .join(APP_DIR_NAME),
    };

    std::fs::create_dir_all(&dir)?;
    debug!(dir = %dir.display(), "resolved data directory");
    Ok(dir)
}

/// Default catalog database path for a data directory.
pub fn default_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let wanted = tmp.path().join("nested").join("data");
        let dir = resolve_data_dir(Some(&wanted)).unwrap();
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }

    #[test]
    fn override_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let a = resolve_data_dir(Some(tmp.path())).unwrap();
        let b = resolve_data_dir(Some(tmp.path())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_override_becomes_absolute() {
        let tmp = tempfile::tempdir_in(".").unwrap();
        let name = tmp.path().file_name().unwrap().to_owned();
        let dir = resolve_data_dir(Some(Path::new(&name))).unwrap();
        assert!(dir.is_absolute());
        assert!(dir.ends_with(&name));
    }

    #[test]
    fn db_path_is_inside_data_dir() {
        let p = default_db_path(Path::new("/data"));
        assert_eq!(p, Path::new("/data").join("merviche.trunkflight.db"));
    }
}
