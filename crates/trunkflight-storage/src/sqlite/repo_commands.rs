//! Run commands (`repo_commands` table) and their joined reads.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::{Connection, params};
use tracing::debug;

use trunkflight_core::repo::{GitRepo, RepoCommand, RepoEntry, group_by_repo};

use crate::error::{Result, StorageError};
use crate::sqlite::git_repos::scan_git_repo;
use crate::sqlite::store::SqliteStore;

/// Command columns followed by the owning repository's columns.
const JOINED_SELECT: &str = "SELECT rc.repo_command_id, rc.git_repo_id, rc.command,
        gr.git_repo_id, gr.repo_path, gr.git_url, gr.username, gr.password
   FROM repo_commands rc
   JOIN git_repos gr ON gr.git_repo_id = rc.git_repo_id";

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Inserts a command unless the same (repository, command) pair exists.
/// Returns the id of the new or existing row; existing rows are untouched.
///
/// Both statements must run in one transaction; callers pass either a
/// transaction or use [`SqliteStore::upsert_repo_command_impl`].
pub(crate) fn upsert_repo_command_on_conn(conn: &Connection, command: &RepoCommand) -> Result<i64> {
    conn.execute(
        "INSERT INTO repo_commands (git_repo_id, command) VALUES (?1, ?2)
         ON CONFLICT (git_repo_id, command) DO NOTHING",
        params![command.git_repo_id, command.command],
    )?;
    let id: i64 = conn.query_row(
        "SELECT repo_command_id FROM repo_commands WHERE git_repo_id = ?1 AND command = ?2",
        params![command.git_repo_id, command.command],
        |row| row.get(0),
    )?;
    debug!(id, git_repo_id = command.git_repo_id, "upserted repo command");
    Ok(id)
}

/// Reads joined rows, newest first, giving every row of one repository the
/// same shared [`GitRepo`].
fn query_joined(conn: &Connection, suffix: &str) -> Result<Vec<RepoCommand>> {
    let mut stmt = conn.prepare(&format!(
        "{JOINED_SELECT} ORDER BY rc.repo_command_id DESC{suffix}"
    ))?;
    let rows = stmt
        .query_map([], |row| {
            let command = RepoCommand {
                id: row.get(0)?,
                git_repo_id: row.get(1)?,
                command: row.get(2)?,
                git_repo: None,
            };
            Ok((command, scan_git_repo(row, 3)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut shared: HashMap<i64, Arc<GitRepo>> = HashMap::new();
    Ok(rows
        .into_iter()
        .map(|(mut command, repo)| {
            let repo = shared
                .entry(repo.id)
                .or_insert_with(|| Arc::new(repo))
                .clone();
            command.git_repo = Some(repo);
            command
        })
        .collect())
}

pub(crate) fn list_repo_commands_on_conn(conn: &Connection) -> Result<Vec<RepoCommand>> {
    query_joined(conn, "")
}

pub(crate) fn latest_repo_command_on_conn(conn: &Connection) -> Result<Option<RepoCommand>> {
    Ok(query_joined(conn, " LIMIT 1")?.into_iter().next())
}

// ---------------------------------------------------------------------------
// SqliteStore methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn upsert_repo_command_impl(&self, command: &RepoCommand) -> Result<i64> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        let id = upsert_repo_command_on_conn(&tx, command)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(id)
    }

    pub fn list_repo_commands_impl(&self) -> Result<Vec<RepoCommand>> {
        let conn = self.lock_conn()?;
        list_repo_commands_on_conn(&conn)
    }

    pub fn latest_repo_command_impl(&self) -> Result<Option<RepoCommand>> {
        let conn = self.lock_conn()?;
        latest_repo_command_on_conn(&conn)
    }

    pub fn list_repo_entries_impl(&self) -> Result<Vec<RepoEntry>> {
        Ok(group_by_repo(self.list_repo_commands_impl()?))
    }
}
