//! Catalog records -- repository registrations and their run commands.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::repo_path::is_http_url;

/// A registered repository.
///
/// `git_url` is the natural key: re-registering the same URL updates
/// `repo_path` and the credentials in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepo {
    /// Assigned by the store on first insert; `0` before that.
    #[serde(default)]
    pub id: i64,

    /// Storage path of the mirror, relative to the user data directory.
    pub repo_path: String,

    pub git_url: String,

    /// HTTP(S) username. Never used for local remotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// HTTP(S) password or token.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl GitRepo {
    /// Creates an unsaved record without credentials.
    pub fn new(git_url: impl Into<String>, repo_path: impl Into<String>) -> Self {
        Self {
            id: 0,
            repo_path: repo_path.into(),
            git_url: git_url.into(),
            username: None,
            password: None,
        }
    }

    /// Attaches HTTP(S) credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the credentials to present to the remote, if any.
    ///
    /// Only HTTP(S) remotes get credentials; `file://` and other transports
    /// never do, even if the record carries them.
    pub fn http_credentials(&self) -> Option<(&str, &str)> {
        if !is_http_url(&self.git_url) {
            return None;
        }
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (Some(user), None) => Some((user, "")),
            _ => None,
        }
    }
}

/// A run command configured for a repository.
///
/// The pair (`git_repo_id`, `command`) is unique; the command text is part
/// of the key, not an updatable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCommand {
    #[serde(default)]
    pub id: i64,

    pub git_repo_id: i64,

    /// Shell-invocable command line.
    pub command: String,

    /// The owning repository, populated by joined reads. Rows that share a
    /// repository share one allocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo: Option<Arc<GitRepo>>,
}

impl RepoCommand {
    /// Creates an unsaved command for the given repository id.
    pub fn new(git_repo_id: i64, command: impl Into<String>) -> Self {
        Self {
            id: 0,
            git_repo_id,
            command: command.into(),
            git_repo: None,
        }
    }
}

/// One repository together with all of its commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoEntry {
    pub repo: Arc<GitRepo>,
    pub commands: Vec<RepoCommand>,
}

/// Collapses joined command rows into one [`RepoEntry`] per repository.
///
/// Entries keep the order in which their repository first appears, and
/// commands keep their input order, so newest-first input yields
/// newest-first output. Commands without a populated repository are
/// dropped.
pub fn group_by_repo(commands: Vec<RepoCommand>) -> Vec<RepoEntry> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut entries: Vec<RepoEntry> = Vec::new();

    for command in commands {
        let Some(repo) = command.git_repo.clone() else {
            continue;
        };
        match index.get(&command.git_repo_id) {
            Some(&i) => entries[i].commands.push(command),
            None => {
                index.insert(command.git_repo_id, entries.len());
                entries.push(RepoEntry {
                    repo,
                    commands: vec![command],
                });
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn joined(id: i64, repo: &Arc<GitRepo>, command: &str) -> RepoCommand {
        RepoCommand {
            id,
            git_repo_id: repo.id,
            command: command.to_string(),
            git_repo: Some(Arc::clone(repo)),
        }
    }

    #[test]
    fn http_credentials_only_for_http_remotes() {
        let http = GitRepo::new("https://example.com/org/repo.git", "src/com.example/org/repo.git")
            .with_credentials("alice", "s3cret");
        assert_eq!(http.http_credentials(), Some(("alice", "s3cret")));

        let local = GitRepo::new("file:///srv/git/repo", "src/file/repo")
            .with_credentials("alice", "s3cret");
        assert_eq!(local.http_credentials(), None);

        let anonymous = GitRepo::new("https://example.com/org/repo.git", "x");
        assert_eq!(anonymous.http_credentials(), None);
    }

    #[test]
    fn group_by_repo_collapses_fan_out() {
        let a = Arc::new(GitRepo {
            id: 1,
            ..GitRepo::new("https://a.example/x", "src/example.a/x")
        });
        let b = Arc::new(GitRepo {
            id: 2,
            ..GitRepo::new("https://b.example/y", "src/example.b/y")
        });

        let rows = vec![
            joined(4, &b, "make test"),
            joined(3, &a, "cargo run"),
            joined(2, &b, "make"),
            joined(1, &a, "cargo test"),
        ];

        let entries = group_by_repo(rows);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].repo.id, 2);
        assert_eq!(
            entries[0]
                .commands
                .iter()
                .map(|c| c.command.as_str())
                .collect::<Vec<_>>(),
            vec!["make test", "make"]
        );
        assert_eq!(entries[1].repo.id, 1);
        assert_eq!(entries[1].commands.len(), 2);
        assert!(Arc::ptr_eq(&entries[1].repo, &a));
    }

    #[test]
    fn group_by_repo_skips_unjoined_rows() {
        let entries = group_by_repo(vec![RepoCommand::new(7, "ls")]);
        assert!(entries.is_empty());
    }

    #[test]
    fn password_is_never_serialized() {
        let repo = GitRepo::new("https://example.com/r", "src/com.example/r")
            .with_credentials("alice", "s3cret");
        let json = serde_json::to_string(&repo).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("s3cret"));
    }
}
