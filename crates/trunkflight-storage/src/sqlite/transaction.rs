//! Transaction wrapper for [`SqliteStore`].

use rusqlite::Connection;

use trunkflight_core::repo::{GitRepo, RepoCommand};

use crate::error::{Result, StorageError};
use crate::sqlite::git_repos;
use crate::sqlite::repo_commands;
use crate::sqlite::store::SqliteStore;
use crate::traits::CatalogTransaction;

/// A thin wrapper around a SQLite connection that is inside a transaction.
///
/// Delegates to the same connection-level helpers used by [`SqliteStore`].
pub(crate) struct SqliteTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl CatalogTransaction for SqliteTx<'_> {
    fn upsert_git_repo(&self, repo: &GitRepo) -> Result<i64> {
        git_repos::upsert_git_repo_on_conn(self.conn, repo)
    }

    fn get_git_repo_by_url(&self, url: &str) -> Result<GitRepo> {
        git_repos::get_git_repo_by_url_on_conn(self.conn, url)
    }

    fn upsert_repo_command(&self, command: &RepoCommand) -> Result<i64> {
        repo_commands::upsert_repo_command_on_conn(self.conn, command)
    }

    fn delete_git_repo(&self, id: i64) -> Result<()> {
        git_repos::delete_git_repo_on_conn(self.conn, id)
    }
}

// ---------------------------------------------------------------------------
// SqliteStore::run_in_transaction
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Runs a closure inside a database transaction.
    ///
    /// Commits when the closure succeeds; any error rolls everything back.
    pub fn run_in_transaction_impl(
        &self,
        f: &dyn Fn(&dyn CatalogTransaction) -> Result<()>,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        let sqlite_tx = SqliteTx { conn: &tx };
        f(&sqlite_tx)?;

        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn transaction_commit() {
        let store = test_store();
        let repo_id = Cell::new(0);

        store
            .run_in_transaction_impl(&|tx| {
                let id = tx.upsert_git_repo(&GitRepo::new("file:///srv/app", "src/file/app"))?;
                tx.upsert_repo_command(&RepoCommand::new(id, "make run"))?;
                repo_id.set(id);
                Ok(())
            })
            .unwrap();

        let entries = store.list_repo_entries_impl().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].repo.id, repo_id.get());
        assert_eq!(entries[0].commands[0].command, "make run");
    }

    #[test]
    fn transaction_rollback_on_error() {
        let store = test_store();

        let result = store.run_in_transaction_impl(&|tx| {
            let id = tx.upsert_git_repo(&GitRepo::new("file:///srv/app", "src/file/app"))?;
            tx.upsert_repo_command(&RepoCommand::new(id, "make run"))?;
            Err(StorageError::Transaction("test rollback".into()))
        });
        assert!(result.is_err());

        assert!(store.list_git_repos_impl().unwrap().is_empty());
        assert!(store.list_repo_commands_impl().unwrap().is_empty());
    }

    #[test]
    fn transaction_sees_its_own_writes() {
        let store = test_store();
        store
            .run_in_transaction_impl(&|tx| {
                tx.upsert_git_repo(&GitRepo::new("file:///srv/app", "src/file/app"))?;
                let repo = tx.get_git_repo_by_url("file:///srv/app")?;
                tx.delete_git_repo(repo.id)
            })
            .unwrap();
        assert!(store.list_git_repos_impl().unwrap().is_empty());
    }
}
