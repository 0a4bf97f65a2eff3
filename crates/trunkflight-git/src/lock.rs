//! Per-mirror advisory lock.
//!
//! Clone, fetch and worktree operations on one mirror must not overlap,
//! across threads or processes. Each mirror gets a sibling lock file
//! (`<mirror>.lock`); different mirrors never contend.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{GitError, Result};

/// Exclusive lock on one mirror, released on drop.
#[derive(Debug)]
pub struct MirrorLock {
    file: File,
    path: PathBuf,
}

impl MirrorLock {
    /// Path of the lock file guarding `mirror_path`.
    pub fn lock_path(mirror_path: &Path) -> PathBuf {
        let mut name = mirror_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        mirror_path.with_file_name(name)
    }

    /// Blocks until the lock for `mirror_path` is held.
    pub fn acquire(mirror_path: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(mirror_path)?;
        debug!(path = %path.display(), "waiting for mirror lock");
        FileExt::lock_exclusive(&file).map_err(|source| GitError::Lock {
            path: path.clone(),
            source,
        })?;
        Ok(Self { file, path })
    }

    /// Takes the lock if nobody holds it; `None` if it is contended.
    pub fn try_acquire(mirror_path: &Path) -> Result<Option<Self>> {
        let (file, path) = open_lock_file(mirror_path)?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(source) => Err(GitError::Lock { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MirrorLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(mirror_path: &Path) -> Result<(File, PathBuf)> {
    let path = MirrorLock::lock_path(mirror_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|source| GitError::Lock {
            path: path.clone(),
            source,
        })?;
    Ok((file, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_mirror() {
        let p = MirrorLock::lock_path(Path::new("/data/src/com.github/org/app.git"));
        assert_eq!(p, Path::new("/data/src/com.github/org/app.git.lock"));
    }

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = dir.path().join("src").join("file").join("app");

        let held = MirrorLock::acquire(&mirror).unwrap();
        assert!(held.path().is_file());
        assert!(MirrorLock::try_acquire(&mirror).unwrap().is_none());

        drop(held);
        assert!(MirrorLock::try_acquire(&mirror).unwrap().is_some());
    }

    #[test]
    fn different_mirrors_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let _a = MirrorLock::acquire(&dir.path().join("a")).unwrap();
        assert!(MirrorLock::try_acquire(&dir.path().join("b")).unwrap().is_some());
    }
}
