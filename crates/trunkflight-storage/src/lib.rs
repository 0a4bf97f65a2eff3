//! Catalog storage for trunkflight.
//!
//! Provides the [`Catalog`] trait and a SQLite implementation ([`SqliteStore`]).

pub mod error;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use error::{Result, StorageError};
pub use sqlite::SqliteStore;
pub use traits::{Catalog, CatalogTransaction};

// ---------------------------------------------------------------------------
// Catalog trait implementation for SqliteStore
// ---------------------------------------------------------------------------

use trunkflight_core::repo::{GitRepo, RepoCommand, RepoEntry};

impl Catalog for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        SqliteStore::ensure_schema(self)
    }

    fn upsert_git_repo(&self, repo: &GitRepo) -> Result<i64> {
        self.upsert_git_repo_impl(repo)
    }

    fn get_git_repo_by_url(&self, url: &str) -> Result<GitRepo> {
        self.get_git_repo_by_url_impl(url)
    }

    fn list_git_repos(&self) -> Result<Vec<GitRepo>> {
        self.list_git_repos_impl()
    }

    fn delete_git_repo(&self, id: i64) -> Result<()> {
        self.delete_git_repo_impl(id)
    }

    fn upsert_repo_command(&self, command: &RepoCommand) -> Result<i64> {
        self.upsert_repo_command_impl(command)
    }

    fn list_repo_commands(&self) -> Result<Vec<RepoCommand>> {
        self.list_repo_commands_impl()
    }

    fn latest_repo_command(&self) -> Result<Option<RepoCommand>> {
        self.latest_repo_command_impl()
    }

    fn list_repo_entries(&self) -> Result<Vec<RepoEntry>> {
        self.list_repo_entries_impl()
    }

    fn run_in_transaction(
        &self,
        f: &dyn Fn(&dyn CatalogTransaction) -> Result<()>,
    ) -> Result<()> {
        self.run_in_transaction_impl(f)
    }
}
