//! [`SandboxManager`] -- disposable linked worktrees of a mirror.
//!
//! A sandbox is a worktree checked out at a detached commit. It is
//! registered in the mirror under a generated ULID that callers never see;
//! removal finds the registration again by comparing the canonical path
//! each `worktrees/<name>/gitdir` file points at.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::build::CheckoutBuilder;
use git2::{BranchType, Commit, ErrorCode, Repository, WorktreeAddOptions};
use tracing::{debug, info, warn};
use ulid::Ulid;
use walkdir::WalkDir;

use crate::error::{GitError, Result};
use crate::mirror::MirrorService;
use crate::paths::{canonical_path, ensure_fully_qualified, normalize_git_path};
use crate::registry::SandboxRegistry;

/// Directory inside the mirror that holds per-worktree metadata.
const WORKTREES_DIR: &str = "worktrees";

/// Per-worktree file holding the path of the worktree's `.git` file.
const GITDIR_FILE: &str = "gitdir";

/// A worktree registered in a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxInfo {
    /// Internal worktree name.
    pub name: String,
    /// Directory the worktree is checked out in.
    pub path: PathBuf,
    /// Whether that directory still exists.
    pub exists: bool,
}

/// Creates and destroys sandboxes of one mirror.
#[derive(Debug, Clone)]
pub struct SandboxManager {
    mirror_path: PathBuf,
    registry: Option<Arc<SandboxRegistry>>,
}

impl SandboxManager {
    pub fn new(mirror_path: impl Into<PathBuf>) -> Self {
        Self {
            mirror_path: mirror_path.into(),
            registry: None,
        }
    }

    /// Manager for the mirror of `mirror`.
    pub fn for_mirror(mirror: &MirrorService) -> Self {
        Self::new(mirror.mirror_path())
    }

    /// Records every sandbox created through this manager in `registry`.
    pub fn with_registry(mut self, registry: Arc<SandboxRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }

    fn open_mirror(&self) -> Result<Repository> {
        if !self.mirror_path.exists() {
            return Err(GitError::MirrorMissing(self.mirror_path.clone()));
        }
        Ok(Repository::open_bare(&self.mirror_path)?)
    }

    // -- Add ------------------------------------------------------------------

    /// Checks out `committish` in a new worktree at `target_dir`, detached.
    ///
    /// `committish` is resolved as `origin/<committish>` first, then as
    /// given. `target_dir` must not exist or be an empty directory. If any
    /// step after registering the worktree fails, the partial sandbox is
    /// removed again.
    pub fn add(&self, target_dir: &Path, committish: &str) -> Result<()> {
        ensure_fully_qualified(target_dir)?;
        let repo = self.open_mirror()?;
        let commit = resolve_commit(&repo, committish)?;
        prepare_target(target_dir)?;

        let name = Ulid::new().to_string();
        debug!(%name, target = %target_dir.display(), commit = %commit.id(), "adding sandbox");

        if let Err(e) = self.materialize(&repo, &name, target_dir, &commit) {
            warn!(target = %target_dir.display(), error = %e, "sandbox creation failed, cleaning up");
            if let Err(cleanup) = self.remove(target_dir) {
                warn!(target = %target_dir.display(), error = %cleanup, "cleanup of partial sandbox failed");
            }
            if let Err(branch) = delete_branch(&repo, &name) {
                warn!(%name, error = %branch, "failed to delete worktree branch");
            }
            return Err(e);
        }

        if let Some(registry) = &self.registry {
            registry.register(target_dir, &self.mirror_path);
        }
        info!(target = %target_dir.display(), commit = %commit.id(), "sandbox ready");
        Ok(())
    }

    fn materialize(
        &self,
        repo: &Repository,
        name: &str,
        target_dir: &Path,
        commit: &Commit<'_>,
    ) -> Result<()> {
        // libgit2 insists on checking out a branch when adding a worktree.
        let branch = repo.branch(name, commit, false)?;
        let mut opts = WorktreeAddOptions::new();
        opts.reference(Some(branch.get()));
        let worktree = repo.worktree(name, target_dir, Some(&opts))?;

        let sandbox = Repository::open_from_worktree(&worktree)?;
        sandbox.set_head_detached(commit.id())?;
        sandbox.checkout_head(Some(CheckoutBuilder::new().force()))?;

        // The branch is shared by both views; whichever sees it first deletes it.
        delete_branch(&sandbox, name)?;
        delete_branch(repo, name)?;
        Ok(())
    }

    // -- Remove ---------------------------------------------------------------

    /// Deletes the sandbox at `target_dir`.
    ///
    /// The mirror's registration is found by path, then deleted; a
    /// registration that is already gone is fine. `target_dir` is deleted
    /// recursively whether or not a registration was found; if it is a
    /// symlink, the directory it resolves to goes too. Calling this on a
    /// missing sandbox succeeds.
    pub fn remove(&self, target_dir: &Path) -> Result<()> {
        ensure_fully_qualified(target_dir)?;
        let wanted = canonical_path(target_dir);

        if let Some(admin) = self
            .registrations()
            .into_iter()
            .find(|(_, dir)| canonical_path(dir) == wanted)
            .map(|(admin, _)| admin)
        {
            match fs::remove_dir_all(&admin) {
                Ok(()) => debug!(admin = %admin.display(), "removed worktree registration"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(admin = %admin.display(), "worktree registration already gone");
                }
                Err(e) => {
                    warn!(admin = %admin.display(), error = %e, "failed to remove worktree registration");
                }
            }
        }

        // A link to the sandbox takes the checked-out directory with it.
        let is_link = fs::symlink_metadata(target_dir)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if is_link {
            ignore_not_found(fs::remove_dir_all(&wanted))?;
            ignore_not_found(remove_link(target_dir))?;
        } else {
            ignore_not_found(fs::remove_dir_all(target_dir))?;
        }

        if let Some(registry) = &self.registry {
            registry.unregister(&wanted);
        }
        info!(target = %target_dir.display(), "sandbox removed");
        Ok(())
    }

    // -- List -----------------------------------------------------------------

    /// Worktrees registered in the mirror, by name.
    pub fn list(&self) -> Vec<SandboxInfo> {
        let mut sandboxes: Vec<SandboxInfo> = self
            .registrations()
            .into_iter()
            .map(|(admin, path)| SandboxInfo {
                name: admin
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                exists: path.exists(),
                path,
            })
            .collect();
        sandboxes.sort_by(|a, b| a.name.cmp(&b.name));
        sandboxes
    }

    /// `(admin dir, worktree dir)` for every readable `gitdir` file under
    /// `<mirror>/worktrees`. Unreadable entries are skipped.
    fn registrations(&self) -> Vec<(PathBuf, PathBuf)> {
        let root = self.mirror_path.join(WORKTREES_DIR);
        WalkDir::new(&root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .file_name()
                        .to_string_lossy()
                        .eq_ignore_ascii_case(GITDIR_FILE)
            })
            .filter_map(|entry| {
                let admin = entry.path().parent()?.to_path_buf();
                let pointer = fs::read_to_string(entry.path()).ok()?;
                let dot_git = admin.join(normalize_git_path(&pointer));
                let worktree = dot_git.parent()?.to_path_buf();
                Some((admin, worktree))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_commit<'r>(repo: &'r Repository, committish: &str) -> Result<Commit<'r>> {
    if !committish.trim().is_empty() {
        for spec in [format!("origin/{committish}"), committish.to_string()] {
            if let Ok(commit) = repo.revparse_single(&spec).and_then(|o| o.peel_to_commit()) {
                return Ok(commit);
            }
        }
    }
    Err(GitError::CommittishNotFound(committish.to_string()))
}

/// Worktree creation needs a fresh path: an empty directory is removed,
/// anything else is refused. Missing parents are created.
fn prepare_target(target_dir: &Path) -> Result<()> {
    match fs::read_dir(target_dir) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                return Err(GitError::SandboxPathOccupied(target_dir.to_path_buf()));
            }
            fs::remove_dir(target_dir)?;
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(_) if target_dir.exists() => {
            return Err(GitError::SandboxPathOccupied(target_dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn ignore_not_found(result: std::io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Windows keeps directory symlinks as directories.
fn remove_link(link: &Path) -> std::io::Result<()> {
    fs::remove_file(link).or_else(|_| fs::remove_dir(link))
}

fn delete_branch(repo: &Repository, name: &str) -> Result<()> {
    match repo.find_branch(name, BranchType::Local) {
        Ok(mut branch) => Ok(branch.delete()?),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Upstream, local_branches};
    use pretty_assertions::assert_eq;

    struct Setup {
        up: Upstream,
        _data: tempfile::TempDir,
        scratch: tempfile::TempDir,
        mirror: MirrorService,
    }

    fn setup() -> Setup {
        let up = Upstream::with_history();
        let data = tempfile::tempdir().unwrap();
        let mirror = MirrorService::new(data.path(), up.git_repo());
        mirror.clone_mirror().unwrap();
        Setup {
            up,
            _data: data,
            scratch: tempfile::tempdir().unwrap(),
            mirror,
        }
    }

    fn head_of(dir: &Path) -> git2::Oid {
        Repository::open(dir).unwrap().head().unwrap().target().unwrap()
    }

    #[test]
    fn add_checks_out_detached_commit() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let target = s.scratch.path().join("sbx");

        mgr.add(&target, "main").unwrap();

        assert_eq!(
            fs::read_to_string(target.join("README.md")).unwrap(),
            "hello again\n"
        );
        let sandbox = Repository::open(&target).unwrap();
        assert!(sandbox.head_detached().unwrap());
        assert_eq!(
            head_of(&target),
            s.up.repo.refname_to_id("refs/heads/main").unwrap()
        );
    }

    #[test]
    fn add_leaves_no_stray_branch() {
        let s = setup();
        let before = local_branches(s.mirror.mirror_path());
        let mgr = SandboxManager::for_mirror(&s.mirror);
        mgr.add(&s.scratch.path().join("sbx"), "dev").unwrap();
        assert_eq!(local_branches(s.mirror.mirror_path()), before);
        assert_eq!(mgr.list().len(), 1);
    }

    #[test]
    fn add_resolves_abbreviated_hash() {
        let s = setup();
        let dev_tip = s.up.repo.refname_to_id("refs/heads/dev").unwrap();
        let short = &dev_tip.to_string()[..7];
        let target = s.scratch.path().join("sbx");

        SandboxManager::for_mirror(&s.mirror).add(&target, short).unwrap();
        assert_eq!(head_of(&target), dev_tip);
        assert!(target.join("dev.txt").is_file());
    }

    #[test]
    fn add_unknown_committish() {
        let s = setup();
        let target = s.scratch.path().join("sbx");
        let err = SandboxManager::for_mirror(&s.mirror)
            .add(&target, "no-such-ref")
            .unwrap_err();
        assert!(matches!(err, GitError::CommittishNotFound(ref c) if c == "no-such-ref"));
        assert!(!target.exists());
    }

    #[test]
    fn add_refuses_occupied_path() {
        let s = setup();
        let target = s.scratch.path().join("sbx");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "mine").unwrap();

        let err = SandboxManager::for_mirror(&s.mirror)
            .add(&target, "main")
            .unwrap_err();
        assert!(matches!(err, GitError::SandboxPathOccupied(_)));
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "mine");
    }

    #[test]
    fn add_reuses_empty_directory() {
        let s = setup();
        let target = s.scratch.path().join("sbx");
        fs::create_dir(&target).unwrap();
        SandboxManager::for_mirror(&s.mirror).add(&target, "main").unwrap();
        assert!(target.join("README.md").is_file());
    }

    #[test]
    fn relative_target_violates_policy() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        assert!(mgr.add(Path::new("sbx"), "main").unwrap_err().is_path_policy_violation());
        assert!(mgr.remove(Path::new("sbx")).unwrap_err().is_path_policy_violation());
    }

    #[test]
    fn remove_deletes_directory_and_registration() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let target = s.scratch.path().join("sbx");
        mgr.add(&target, "main").unwrap();

        mgr.remove(&target).unwrap();

        assert!(!target.exists());
        assert!(mgr.list().is_empty());
        let repo = s.mirror.open().unwrap();
        assert_eq!(repo.worktrees().unwrap().len(), 0);
    }

    #[test]
    fn remove_only_touches_matching_sandbox() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let a = s.scratch.path().join("a");
        let b = s.scratch.path().join("b");
        mgr.add(&a, "main").unwrap();
        mgr.add(&b, "dev").unwrap();

        mgr.remove(&a).unwrap();

        assert!(b.join("dev.txt").is_file());
        let left = mgr.list();
        assert_eq!(left.len(), 1);
        assert_eq!(canonical_path(&left[0].path), canonical_path(&b));
    }

    #[test]
    fn remove_is_idempotent() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let target = s.scratch.path().join("sbx");
        mgr.add(&target, "main").unwrap();
        mgr.remove(&target).unwrap();
        mgr.remove(&target).unwrap();
    }

    #[test]
    fn remove_cleans_registration_of_deleted_directory() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let target = s.scratch.path().join("sbx");
        mgr.add(&target, "main").unwrap();
        fs::remove_dir_all(&target).unwrap();

        let listed = mgr.list();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].exists);

        mgr.remove(&target).unwrap();
        assert!(mgr.list().is_empty());
    }

    #[test]
    fn remove_without_mirror_still_deletes_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let target = scratch.path().join("orphan");
        fs::create_dir_all(target.join("nested")).unwrap();

        SandboxManager::new(scratch.path().join("no-mirror"))
            .remove(&target)
            .unwrap();
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn remove_through_symlinked_path() {
        let s = setup();
        let mgr = SandboxManager::for_mirror(&s.mirror);
        let real_root = s.scratch.path().join("real");
        fs::create_dir(&real_root).unwrap();
        let link_root = s.scratch.path().join("link");
        std::os::unix::fs::symlink(&real_root, &link_root).unwrap();

        mgr.add(&real_root.join("sbx"), "main").unwrap();
        mgr.remove(&link_root.join("sbx")).unwrap();

        assert!(!real_root.join("sbx").exists());
        assert!(mgr.list().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn remove_through_symlink_deletes_real_directory() {
        let s = setup();
        let registry = Arc::new(SandboxRegistry::new());
        let mgr = SandboxManager::for_mirror(&s.mirror).with_registry(Arc::clone(&registry));
        let real = s.scratch.path().join("real-sbx");
        let alias = s.scratch.path().join("alias");
        mgr.add(&real, "main").unwrap();
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        mgr.remove(&alias).unwrap();

        assert!(fs::symlink_metadata(&alias).is_err());
        assert!(!real.exists());
        assert!(mgr.list().is_empty());
        assert!(registry.is_empty());
        mgr.remove(&alias).unwrap();
    }

    #[test]
    fn registry_tracks_add_and_remove() {
        let s = setup();
        let registry = Arc::new(SandboxRegistry::new());
        let mgr = SandboxManager::for_mirror(&s.mirror).with_registry(Arc::clone(&registry));
        let target = s.scratch.path().join("sbx");

        mgr.add(&target, "main").unwrap();
        assert_eq!(registry.len(), 1);

        mgr.remove(&target).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_add_is_not_registered() {
        let s = setup();
        let registry = Arc::new(SandboxRegistry::new());
        let mgr = SandboxManager::for_mirror(&s.mirror).with_registry(Arc::clone(&registry));
        assert!(mgr.add(&s.scratch.path().join("sbx"), "nope").is_err());
        assert!(registry.is_empty());
    }
}
