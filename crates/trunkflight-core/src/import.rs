//! Parsing of shared project records.
//!
//! A record is a block of `key=value` lines, typically pasted from the
//! clipboard:
//!
//! ```text
//! git.repo=https://git.example.com/team/app.git
//! git.user=alice
//! git.pass=token
//! project.name=app
//! project.command=cargo run --release
//! ```
//!
//! A record is applied all-or-nothing: any missing required key rejects it.

use std::collections::HashMap;

use thiserror::Error;

use crate::repo::GitRepo;
use crate::repo_path::{self, RepoPathError, is_http_url};

pub const KEY_GIT_REPO: &str = "git.repo";
pub const KEY_GIT_USER: &str = "git.user";
pub const KEY_GIT_PASS: &str = "git.pass";
pub const KEY_PROJECT_NAME: &str = "project.name";
pub const KEY_PROJECT_COMMAND: &str = "project.command";

/// Errors produced while reading an import record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("invalid project data: missing key: {0}")]
    MissingKey(&'static str),

    #[error("invalid project data: line {line} is not key=value: {text}")]
    MalformedLine { line: usize, text: String },

    #[error(transparent)]
    RepoPath(#[from] RepoPathError),
}

/// A validated import record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub git_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project_name: String,
    pub command: String,
}

impl ImportRecord {
    /// Parses and validates a record.
    ///
    /// Values are split at the first `=`, so they may themselves contain
    /// `=`. Later occurrences of a key override earlier ones.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let mut values: HashMap<&str, &str> = HashMap::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ImportError::MalformedLine {
                line: n + 1,
                text: line.to_string(),
            })?;
            values.insert(key.trim(), value);
        }

        let take = |key: &'static str| -> Result<String, ImportError> {
            values
                .get(key)
                .map(|v| v.to_string())
                .ok_or(ImportError::MissingKey(key))
        };

        let git_url = take(KEY_GIT_REPO)?;
        let (username, password) = if is_http_url(&git_url) {
            (Some(take(KEY_GIT_USER)?), Some(take(KEY_GIT_PASS)?))
        } else {
            (
                values.get(KEY_GIT_USER).map(|v| v.to_string()),
                values.get(KEY_GIT_PASS).map(|v| v.to_string()),
            )
        };

        Ok(Self {
            git_url,
            username,
            password,
            project_name: take(KEY_PROJECT_NAME)?,
            command: take(KEY_PROJECT_COMMAND)?,
        })
    }

    /// Builds the unsaved [`GitRepo`] this record registers.
    pub fn to_git_repo(&self) -> Result<GitRepo, ImportError> {
        let repo_path = repo_path::generate_repo_path(&self.git_url)?;
        Ok(GitRepo {
            id: 0,
            repo_path: repo_path.to_string_lossy().into_owned(),
            git_url: self.git_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}
