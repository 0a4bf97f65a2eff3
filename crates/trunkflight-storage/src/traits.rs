//! Catalog and CatalogTransaction traits -- the public API for catalog
//! persistence.
//!
//! Consumers depend on these traits rather than on [`SqliteStore`] so that
//! alternative backends (mocks, proxies, etc.) can be substituted.
//!
//! [`SqliteStore`]: crate::SqliteStore

use trunkflight_core::repo::{GitRepo, RepoCommand, RepoEntry};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// Persisted set of repository registrations and their run commands.
pub trait Catalog: Send + Sync {
    // -- Schema -------------------------------------------------------------

    /// Creates tables and indexes if absent. Idempotent.
    fn ensure_schema(&self) -> Result<()>;

    // -- Repositories ---------------------------------------------------------

    /// Inserts `repo`, or updates path and credentials of the row with the
    /// same URL. Returns the id of the row.
    fn upsert_git_repo(&self, repo: &GitRepo) -> Result<i64>;
    fn get_git_repo_by_url(&self, url: &str) -> Result<GitRepo>;
    fn list_git_repos(&self) -> Result<Vec<GitRepo>>;

    /// Deletes a repository together with all of its commands.
    fn delete_git_repo(&self, id: i64) -> Result<()>;

    // -- Commands -------------------------------------------------------------

    /// Inserts `command` unless an identical (repository, command) pair
    /// exists. Returns the id of the new or existing row.
    fn upsert_repo_command(&self, command: &RepoCommand) -> Result<i64>;

    /// All commands, newest first, each with its repository populated.
    fn list_repo_commands(&self) -> Result<Vec<RepoCommand>>;

    /// The most recently inserted command with its repository.
    fn latest_repo_command(&self) -> Result<Option<RepoCommand>>;

    /// Commands grouped by repository; see [`trunkflight_core::group_by_repo`].
    fn list_repo_entries(&self) -> Result<Vec<RepoEntry>>;

    // -- Transactions ---------------------------------------------------------

    fn run_in_transaction(&self, f: &dyn Fn(&dyn CatalogTransaction) -> Result<()>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// CatalogTransaction trait
// ---------------------------------------------------------------------------

/// Write operations available inside [`Catalog::run_in_transaction`].
pub trait CatalogTransaction {
    fn upsert_git_repo(&self, repo: &GitRepo) -> Result<i64>;
    fn get_git_repo_by_url(&self, url: &str) -> Result<GitRepo>;
    fn upsert_repo_command(&self, command: &RepoCommand) -> Result<i64>;
    fn delete_git_repo(&self, id: i64) -> Result<()>;
}
