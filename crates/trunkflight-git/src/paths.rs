//! Path policy and symlink-aware path comparison.
//!
//! Sandbox roots usually live under the OS temp directory, which is a
//! symlink on some platforms (`/var` -> `/private/var` on macOS). Paths
//! recorded in mirror metadata and paths supplied by callers are therefore
//! compared only after [`canonical_path`].

use std::path::{Component, Path, PathBuf};

use crate::error::{GitError, Result};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fails with [`GitError::PathPolicyViolation`] unless `path` is absolute
/// and fully qualified (on Windows: drive or UNC prefix plus root).
pub fn ensure_fully_qualified(path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(GitError::PathPolicyViolation {
            path: path.to_path_buf(),
        })
    }
}

/// Resolves symlinks component by component, left to right, like POSIX
/// `realpath`.
///
/// Unlike [`std::fs::canonicalize`] the path does not have to exist: a
/// component that is missing or is not a link is kept as written. `.` is
/// dropped and `..` removes the previously resolved component.
pub fn canonical_path(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other.as_os_str());
                let is_link = std::fs::symlink_metadata(&resolved)
                    .map(|m| m.file_type().is_symlink())
                    .unwrap_or(false);
                if is_link {
                    if let Ok(target) = std::fs::canonicalize(&resolved) {
                        resolved = strip_verbatim(target);
                    }
                }
            }
        }
    }

    resolved
}

/// Returns `true` if both paths name the same location after
/// [`canonical_path`].
pub fn same_location(a: &Path, b: &Path) -> bool {
    canonical_path(a) == canonical_path(b)
}

/// Converts a path read from a git metadata file to native form.
///
/// libgit2 writes forward slashes on every platform; Git for Windows may
/// also write MSYS-style `/c/Users/...` paths.
pub fn normalize_git_path(path: &str) -> PathBuf {
    let path = path.trim();

    // On non-Windows, return as-is.
    if std::path::MAIN_SEPARATOR != '\\' {
        return PathBuf::from(path);
    }

    // Convert /c/Users/... to C:\Users\...
    if path.len() >= 3
        && path.as_bytes()[0] == b'/'
        && path.as_bytes()[2] == b'/'
        && path.as_bytes()[1].is_ascii_alphabetic()
    {
        let drive = path.as_bytes()[1].to_ascii_uppercase() as char;
        let rest = &path[2..];
        return PathBuf::from(format!("{drive}:{}", rest.replace('/', "\\")));
    }

    // Convert C:/Users/... to C:\Users\...
    PathBuf::from(path.replace('/', "\\"))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Drops the `\\?\` prefix `canonicalize` adds on Windows so resolved and
/// unresolved paths stay comparable.
fn strip_verbatim(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix(r"\\?\")) {
        Some(rest) if !rest.starts_with("UNC\\") => PathBuf::from(rest),
        _ => path,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
