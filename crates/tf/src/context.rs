//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds all the state a command handler needs:
//! resolved data directory, effective configuration, global flags and the
//! cancellation flag raised by Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::debug;
use trunkflight_config::{TrunkflightConfig, load_config, resolve_data_dir};
use trunkflight_core::GitRepo;
use trunkflight_git::{MirrorLock, MirrorService};
use trunkflight_storage::{Catalog, SqliteStore};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Absolute data directory (mirrors, catalog, config.yaml).
    pub data_dir: PathBuf,

    pub config: TrunkflightConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// Raised by the first Ctrl+C; long git transfers stop when they see it.
    pub cancel: Arc<AtomicBool>,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Creates the data directory if it does not exist yet.
    pub fn from_global_args(global: &GlobalArgs, cancel: Arc<AtomicBool>) -> Result<Self> {
        let data_dir = resolve_data_dir(global.data_dir.as_deref())
            .context("failed to resolve the data directory")?;
        let config = load_config(&data_dir)
            .with_context(|| format!("failed to load configuration from {}", data_dir.display()))?;

        Ok(Self {
            data_dir,
            config,
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
            cancel,
        })
    }

    /// Path of the catalog database.
    pub fn db_path(&self) -> PathBuf {
        self.config.db_path(&self.data_dir)
    }

    /// Opens the catalog, creating its schema if needed.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = self.db_path();
        debug!(path = %path.display(), "opening catalog");
        SqliteStore::open(&path)
            .with_context(|| format!("failed to open catalog {}", path.display()))
    }

    /// Resolves the repository a command operates on.
    ///
    /// With an explicit URL the repository must be registered. Without one,
    /// the repository of the most recently added command is used.
    pub fn resolve_repo(&self, store: &dyn Catalog, url: Option<&str>) -> Result<GitRepo> {
        if let Some(url) = url {
            return store
                .get_git_repo_by_url(url)
                .with_context(|| format!("repository {url} is not registered"));
        }

        store
            .latest_repo_command()
            .context("failed to read the catalog")?
            .and_then(|cmd| cmd.git_repo)
            .map(|repo| GitRepo::clone(&repo))
            .ok_or_else(|| anyhow!("no repository registered; run `tf import` first"))
    }

    /// Mirror service for `repo`, wired to the Ctrl+C flag.
    pub fn mirror(&self, repo: GitRepo) -> MirrorService {
        MirrorService::new(&self.data_dir, repo).with_cancel_flag(Arc::clone(&self.cancel))
    }

    /// Blocks until no other process works on the mirror.
    pub fn lock_mirror(&self, mirror: &MirrorService) -> Result<MirrorLock> {
        let path = mirror.mirror_path();
        let context = || format!("failed to lock mirror {}", path.display());
        if let Some(lock) = MirrorLock::try_acquire(path).with_context(context)? {
            return Ok(lock);
        }
        if !self.quiet {
            eprintln!("Waiting for another tf process using {}...", path.display());
        }
        MirrorLock::acquire(path).with_context(context)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.config.probe_timeout_ms)
    }
}
