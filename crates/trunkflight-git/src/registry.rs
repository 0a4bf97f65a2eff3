//! In-memory record of the sandboxes this process created.
//!
//! Bulk teardown walks this registry instead of guessing at leftovers in the
//! temp directory. Entries are added by [`SandboxManager::add`] and dropped
//! by [`SandboxManager::remove`].
//!
//! [`SandboxManager::add`]: crate::SandboxManager::add
//! [`SandboxManager::remove`]: crate::SandboxManager::remove

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::paths::same_location;
use crate::sandbox::SandboxManager;

/// A sandbox and the mirror it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredSandbox {
    pub target_dir: PathBuf,
    pub mirror_path: PathBuf,
}

/// Thread-safe set of live sandboxes, shared between managers via `Arc`.
#[derive(Debug, Default)]
pub struct SandboxRegistry {
    entries: Mutex<Vec<RegisteredSandbox>>,
}

impl SandboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RegisteredSandbox>> {
        // The list stays consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a sandbox; registering the same target twice keeps one entry.
    pub fn register(&self, target_dir: &Path, mirror_path: &Path) {
        let mut entries = self.lock();
        if entries.iter().any(|e| same_location(&e.target_dir, target_dir)) {
            return;
        }
        entries.push(RegisteredSandbox {
            target_dir: target_dir.to_path_buf(),
            mirror_path: mirror_path.to_path_buf(),
        });
    }

    /// Forgets a sandbox. Returns `true` if it was registered.
    pub fn unregister(&self, target_dir: &Path) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|e| !same_location(&e.target_dir, target_dir));
        entries.len() != before
    }

    /// Snapshot of the registered sandboxes, oldest first.
    pub fn list(&self) -> Vec<RegisteredSandbox> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes every registered sandbox, newest first.
    ///
    /// Failures are logged and skipped; the failed entries stay registered.
    /// Returns how many sandboxes were removed.
    pub fn remove_all(&self) -> usize {
        let snapshot = self.list();
        let mut removed = 0;

        for entry in snapshot.iter().rev() {
            match SandboxManager::new(&entry.mirror_path).remove(&entry.target_dir) {
                Ok(()) => {
                    self.unregister(&entry.target_dir);
                    removed += 1;
                }
                Err(e) => {
                    warn!(target = %entry.target_dir.display(), error = %e, "failed to remove sandbox");
                }
            }
        }

        if removed > 0 {
            info!(removed, "sandboxes torn down");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fixture::Upstream;
    use crate::mirror::MirrorService;

    #[test]
    fn register_and_unregister() {
        let reg = SandboxRegistry::new();
        reg.register(Path::new("/tmp/a"), Path::new("/m"));
        reg.register(Path::new("/tmp/a"), Path::new("/m"));
        reg.register(Path::new("/tmp/b"), Path::new("/m"));
        assert_eq!(reg.len(), 2);

        assert!(reg.unregister(Path::new("/tmp/a")));
        assert!(!reg.unregister(Path::new("/tmp/a")));
        assert_eq!(reg.list()[0].target_dir, Path::new("/tmp/b"));
    }

    #[test]
    fn remove_all_tears_down_every_sandbox() {
        let up = Upstream::with_history();
        let data = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let mirror = MirrorService::new(data.path(), up.git_repo());
        mirror.clone_mirror().unwrap();

        let registry = Arc::new(SandboxRegistry::new());
        let mgr = SandboxManager::for_mirror(&mirror).with_registry(Arc::clone(&registry));
        let a = scratch.path().join("a");
        let b = scratch.path().join("b");
        mgr.add(&a, "main").unwrap();
        mgr.add(&b, "dev").unwrap();

        assert_eq!(registry.remove_all(), 2);
        assert!(registry.is_empty());
        assert!(!a.exists());
        assert!(!b.exists());
        assert!(mgr.list().is_empty());
    }

    #[test]
    fn remove_all_skips_failures() {
        let reg = SandboxRegistry::new();
        // Relative paths are refused by the manager, so this entry survives.
        reg.register(Path::new("relative"), Path::new("/m"));
        assert_eq!(reg.remove_all(), 0);
        assert_eq!(reg.len(), 1);
    }
}
