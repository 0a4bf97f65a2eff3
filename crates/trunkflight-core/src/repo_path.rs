//! Deterministic storage paths for repository mirrors.
//!
//! Every mirror lives under `<data dir>/src/`. HTTP(S) remotes nest by
//! reversed host (`github.com` becomes `com.github`) followed by the URL
//! path segments; local `file://` remotes land in `src/file/<name>`. The
//! mapping is a pure function of the URL string and is part of the on-disk
//! layout, so it must not change without a migration.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Top-level directory for all mirrors under the data dir.
pub const SOURCE_ROOT: &str = "src";

/// Directory under [`SOURCE_ROOT`] holding mirrors of local repositories.
pub const FILE_ROOT: &str = "file";

/// Errors produced while mapping a URL to a storage path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoPathError {
    /// The scheme is neither HTTP(S) nor `file`.
    #[error("unsupported git url scheme '{scheme}': {url}")]
    UnsupportedUrl {
        /// The URL scheme that was rejected.
        scheme: String,
        /// The full URL.
        url: String,
    },

    /// The string could not be parsed, or lacks a host / repository name.
    #[error("invalid git url '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// A specialized `Result` type for path derivation.
pub type Result<T> = std::result::Result<T, RepoPathError>;

/// Returns `true` for `http://` and `https://` URLs (case-insensitive).
pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Maps a repository URL to its mirror path, relative to the data dir.
///
/// # Errors
///
/// Returns [`RepoPathError::UnsupportedUrl`] for schemes other than
/// `http`, `https` and `file`, and [`RepoPathError::InvalidUrl`] when the
/// URL cannot be parsed or does not name a host or repository.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use trunkflight_core::repo_path::generate_repo_path;
///
/// let path = generate_repo_path("https://github.com/rust-lang/cargo.git").unwrap();
/// assert_eq!(path, PathBuf::from("src/com.github/rust-lang/cargo.git"));
/// ```
pub fn generate_repo_path(git_url: &str) -> Result<PathBuf> {
    let url = Url::parse(git_url.trim()).map_err(|e| RepoPathError::InvalidUrl {
        url: git_url.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => http_repo_path(&url, git_url),
        "file" => file_repo_path(&url, git_url),
        other => Err(RepoPathError::UnsupportedUrl {
            scheme: other.to_string(),
            url: git_url.to_string(),
        }),
    }
}

fn http_repo_path(url: &Url, raw: &str) -> Result<PathBuf> {
    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(|| {
        RepoPathError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        }
    })?;

    let reversed_host = host.split('.').rev().collect::<Vec<_>>().join(".");

    let mut path = PathBuf::from(SOURCE_ROOT);
    path.push(reversed_host);
    for segment in non_empty_segments(url) {
        path.push(segment);
    }
    Ok(path)
}

fn file_repo_path(url: &Url, raw: &str) -> Result<PathBuf> {
    let segments = non_empty_segments(url);

    // `/srv/name/.git` names the repository after its parent directory.
    let name = match segments.as_slice() {
        [.., parent, last] if *last == ".git" => Some(*parent),
        [.., last] if *last != ".git" => Some(*last),
        _ => None,
    }
    .ok_or_else(|| RepoPathError::InvalidUrl {
        url: raw.to_string(),
        reason: "no repository name in path".to_string(),
    })?;

    Ok([SOURCE_ROOT, FILE_ROOT, name].iter().collect())
}

fn non_empty_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(parts: &[&str]) -> PathBuf {
        parts.iter().collect()
    }

    #[test]
    fn http_host_labels_are_reversed() {
        assert_eq!(
            generate_repo_path("https://a.b.c/d/e").unwrap(),
            path(&["src", "c.b.a", "d", "e"])
        );
    }

    #[test]
    fn http_keeps_git_suffix_verbatim() {
        assert_eq!(
            generate_repo_path("https://example.com/org/repo.git").unwrap(),
            path(&["src", "com.example", "org", "repo.git"])
        );
    }

    #[test]
    fn plain_http_and_mixed_case_scheme() {
        assert_eq!(
            generate_repo_path("HTTP://git.example.org/team/tool").unwrap(),
            path(&["src", "org.example.git", "team", "tool"])
        );
    }

    #[test]
    fn http_ignores_trailing_slash_and_port() {
        assert_eq!(
            generate_repo_path("https://example.com:8443/org/repo/").unwrap(),
            path(&["src", "com.example", "org", "repo"])
        );
    }

    #[test]
    fn same_url_same_path() {
        let url = "https://gitlab.example.io/group/sub/project.git";
        assert_eq!(
            generate_repo_path(url).unwrap(),
            generate_repo_path(url).unwrap()
        );
    }

    #[test]
    fn file_url_with_dot_git_uses_parent_name() {
        assert_eq!(
            generate_repo_path("file:///home/me/code/name/.git").unwrap(),
            path(&["src", "file", "name"])
        );
    }

    #[test]
    fn file_url_without_dot_git() {
        assert_eq!(
            generate_repo_path("file:///home/me/code/name").unwrap(),
            path(&["src", "file", "name"])
        );
        assert_eq!(
            generate_repo_path("file:///home/me/code/name/").unwrap(),
            path(&["src", "file", "name"])
        );
    }

    #[test]
    fn file_url_without_name_is_invalid() {
        let err = generate_repo_path("file:///").unwrap_err();
        assert!(matches!(err, RepoPathError::InvalidUrl { .. }));
    }

    #[test]
    fn ssh_scheme_is_unsupported() {
        let err = generate_repo_path("ssh://git@example.com/org/repo.git").unwrap_err();
        assert_eq!(
            err,
            RepoPathError::UnsupportedUrl {
                scheme: "ssh".to_string(),
                url: "ssh://git@example.com/org/repo.git".to_string(),
            }
        );
    }

    #[test]
    fn scp_like_syntax_is_rejected() {
        assert!(generate_repo_path("git@example.com:org/repo.git").is_err());
    }

    #[test]
    fn garbage_is_invalid() {
        let err = generate_repo_path("not a url").unwrap_err();
        assert!(matches!(err, RepoPathError::InvalidUrl { .. }));
    }

    #[test]
    fn is_http_url_checks_scheme() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("Http://example.com"));
        assert!(!is_http_url("file:///tmp/repo"));
        assert!(!is_http_url("httpx://example.com"));
    }
}
