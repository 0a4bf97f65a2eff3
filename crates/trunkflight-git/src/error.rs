//! Error types for mirror and sandbox operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during mirror and sandbox operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A path that must be absolute and fully qualified was not.
    #[error("path must be absolute and fully qualified: {}", path.display())]
    PathPolicyViolation {
        /// The offending path.
        path: PathBuf,
    },

    /// The committish did not resolve to a commit in the mirror.
    #[error("committish not found: {0}")]
    CommittishNotFound(String),

    /// The sandbox target exists and is not an empty directory.
    #[error("sandbox path already exists and is not empty: {}", .0.display())]
    SandboxPathOccupied(PathBuf),

    /// The mirror has not been cloned yet.
    #[error("mirror not found at {} (clone it first)", .0.display())]
    MirrorMissing(PathBuf),

    /// A transfer was aborted through the cancellation flag.
    #[error("operation cancelled")]
    Cancelled,

    /// The per-mirror lock could not be acquired.
    #[error("failed to lock mirror {}: {source}", path.display())]
    Lock {
        /// Path of the lock file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An error reported by libgit2.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// A filesystem error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

impl GitError {
    /// Returns `true` if this is [`GitError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is [`GitError::PathPolicyViolation`].
    pub fn is_path_policy_violation(&self) -> bool {
        matches!(self, Self::PathPolicyViolation { .. })
    }
}
