//! Repository registrations (`git_repos` table).

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use trunkflight_core::repo::GitRepo;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

/// Column list matching [`scan_git_repo`].
pub(crate) const GIT_REPO_COLUMNS: &str = "git_repo_id, repo_path, git_url, username, password";

/// Reads a [`GitRepo`] from five consecutive columns starting at `offset`.
pub(crate) fn scan_git_repo(row: &Row<'_>, offset: usize) -> rusqlite::Result<GitRepo> {
    Ok(GitRepo {
        id: row.get(offset)?,
        repo_path: row.get(offset + 1)?,
        git_url: row.get(offset + 2)?,
        username: row.get(offset + 3)?,
        password: row.get(offset + 4)?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Inserts a repository or, when its URL is already registered, updates the
/// path and credentials of the existing row. Returns the row id either way.
///
/// A single statement, so two writers racing on the same URL still end up
/// with one row.
pub(crate) fn upsert_git_repo_on_conn(conn: &Connection, repo: &GitRepo) -> Result<i64> {
    let id: i64 = conn.query_row(
        "INSERT INTO git_repos (repo_path, git_url, username, password)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (git_url) DO UPDATE SET
             repo_path = excluded.repo_path,
             username  = excluded.username,
             password  = excluded.password
         RETURNING git_repo_id",
        params![repo.repo_path, repo.git_url, repo.username, repo.password],
        |row| row.get(0),
    )?;
    debug!(id, url = %repo.git_url, "upserted git repo");
    Ok(id)
}

pub(crate) fn get_git_repo_by_url_on_conn(conn: &Connection, url: &str) -> Result<GitRepo> {
    conn.query_row(
        &format!("SELECT {GIT_REPO_COLUMNS} FROM git_repos WHERE git_url = ?1"),
        params![url],
        |row| scan_git_repo(row, 0),
    )
    .optional()?
    .ok_or_else(|| StorageError::not_found("git repo", url))
}

pub(crate) fn list_git_repos_on_conn(conn: &Connection) -> Result<Vec<GitRepo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GIT_REPO_COLUMNS} FROM git_repos ORDER BY git_url"
    ))?;
    let repos = stmt
        .query_map([], |row| scan_git_repo(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(repos)
}

/// Deletes a repository. Its commands go with it through the cascading
/// foreign key.
pub(crate) fn delete_git_repo_on_conn(conn: &Connection, id: i64) -> Result<()> {
    let affected = conn.execute("DELETE FROM git_repos WHERE git_repo_id = ?1", params![id])?;
    if affected == 0 {
        return Err(StorageError::not_found("git repo", id.to_string()));
    }
    debug!(id, "deleted git repo");
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn upsert_git_repo_impl(&self, repo: &GitRepo) -> Result<i64> {
        let conn = self.lock_conn()?;
        upsert_git_repo_on_conn(&conn, repo)
    }

    pub fn get_git_repo_by_url_impl(&self, url: &str) -> Result<GitRepo> {
        let conn = self.lock_conn()?;
        get_git_repo_by_url_on_conn(&conn, url)
    }

    pub fn list_git_repos_impl(&self) -> Result<Vec<GitRepo>> {
        let conn = self.lock_conn()?;
        list_git_repos_on_conn(&conn)
    }

    pub fn delete_git_repo_impl(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        delete_git_repo_on_conn(&conn, id)
    }
}
