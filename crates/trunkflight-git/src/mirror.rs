//! [`MirrorService`] -- bare mirror lifecycle and read-only projections.
//!
//! A mirror moves from absent to present through [`MirrorService::clone_mirror`]
//! and is refreshed with [`MirrorService::fetch`]. Nothing here deletes a
//! mirror; that is an explicit filesystem operation of the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use git2::build::RepoBuilder;
use git2::{ErrorCode, ReferenceType, Repository, Sort};
use tracing::{debug, info, warn};
use trunkflight_core::{GitRepo, SimpleCommit};

use crate::error::{GitError, Result};
use crate::paths::ensure_fully_qualified;
use crate::remote::{fetch_options, is_user_abort};

/// Ref namespace of the `origin` remote-tracking branches.
pub const ORIGIN_PREFIX: &str = "refs/remotes/origin/";

/// Default number of commits returned by [`MirrorService::latest_commits`].
pub const DEFAULT_COMMIT_LIMIT: usize = 10;

/// Clone, fetch and history reads for the mirror of one [`GitRepo`].
#[derive(Debug, Clone)]
pub struct MirrorService {
    repo: GitRepo,
    mirror_path: PathBuf,
    cancel: Option<Arc<AtomicBool>>,
}

impl MirrorService {
    /// The mirror of `repo` lives at `<data_root>/<repo.repo_path>`.
    pub fn new(data_root: impl AsRef<Path>, repo: GitRepo) -> Self {
        let mirror_path = data_root.as_ref().join(&repo.repo_path);
        Self {
            repo,
            mirror_path,
            cancel: None,
        }
    }

    /// Transfers stop once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn git_repo(&self) -> &GitRepo {
        &self.repo
    }

    pub fn mirror_path(&self) -> &Path {
        &self.mirror_path
    }

    /// Whether the mirror directory is present.
    pub fn exists(&self) -> bool {
        self.mirror_path.exists()
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_deref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Opens the mirror, failing with [`GitError::MirrorMissing`] if it has
    /// not been cloned.
    pub fn open(&self) -> Result<Repository> {
        if !self.exists() {
            return Err(GitError::MirrorMissing(self.mirror_path.clone()));
        }
        Ok(Repository::open_bare(&self.mirror_path)?)
    }

    // -- Transitions ----------------------------------------------------------

    /// Clones the remote as a bare repository.
    ///
    /// Returns `false` without touching anything when the mirror directory
    /// already exists. A failed or cancelled clone leaves no directory
    /// behind, so it can simply be retried.
    pub fn clone_mirror(&self) -> Result<bool> {
        ensure_fully_qualified(&self.mirror_path)?;

        if self.exists() {
            debug!(path = %self.mirror_path.display(), "mirror already present");
            return Ok(false);
        }
        if self.cancelled() {
            return Err(GitError::Cancelled);
        }
        if let Some(parent) = self.mirror_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(url = %self.repo.git_url, path = %self.mirror_path.display(), "cloning mirror");
        let mut builder = RepoBuilder::new();
        builder
            .bare(true)
            .fetch_options(fetch_options(&self.repo, self.cancel.as_deref(), false));

        match builder.clone(&self.repo.git_url, &self.mirror_path) {
            Ok(_) => Ok(true),
            Err(e) => {
                if self.mirror_path.exists() {
                    if let Err(rm) = std::fs::remove_dir_all(&self.mirror_path) {
                        warn!(path = %self.mirror_path.display(), error = %rm, "failed to clean up partial clone");
                    }
                }
                if is_user_abort(&e) && self.cancelled() {
                    info!(url = %self.repo.git_url, "clone cancelled");
                    Err(GitError::Cancelled)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Fetches every configured remote, pruning remote-tracking branches
    /// that no longer exist upstream.
    ///
    /// A cancelled fetch is logged and reported as success; the mirror is
    /// consistent and the next fetch resumes.
    pub fn fetch(&self) -> Result<()> {
        ensure_fully_qualified(&self.mirror_path)?;
        let repo = self.open()?;

        let remotes = repo.remotes()?;
        for name in remotes.iter().flatten() {
            if self.cancelled() {
                info!(remote = name, "fetch cancelled");
                return Ok(());
            }
            let mut remote = repo.find_remote(name)?;
            let mut opts = fetch_options(&self.repo, self.cancel.as_deref(), true);
            debug!(remote = name, "fetching");
            match remote.fetch(&[] as &[&str], Some(&mut opts), Some("trunkflight: fetch")) {
                Ok(()) => {}
                Err(e) if is_user_abort(&e) && self.cancelled() => {
                    info!(remote = name, "fetch cancelled");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(path = %self.mirror_path.display(), "mirror fetched");
        Ok(())
    }

    // -- Projections ----------------------------------------------------------

    /// Branch names under `origin`, most recently committed first.
    ///
    /// Ties on the tip's committer time are broken by name. The symbolic
    /// `origin/HEAD` is skipped.
    pub fn remote_branch_names(&self) -> Result<Vec<String>> {
        let repo = self.open()?;

        let mut branches: Vec<(i64, String)> = Vec::new();
        for reference in repo.references_glob(&format!("{ORIGIN_PREFIX}*"))? {
            let reference = reference?;
            if reference.kind() == Some(ReferenceType::Symbolic) {
                continue;
            }
            let Some(short) = reference.name().and_then(|n| n.strip_prefix(ORIGIN_PREFIX)) else {
                continue;
            };
            if short == "HEAD" {
                continue;
            }
            let tip = reference.peel_to_commit()?;
            branches.push((tip.committer().when().seconds(), short.to_string()));
        }

        branches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        Ok(branches.into_iter().map(|(_, name)| name).collect())
    }

    /// Up to `limit` commits reachable from `origin/<branch>`, newest first.
    ///
    /// Each commit is copied into a [`SimpleCommit`] before the repository
    /// handle is closed. A branch that does not exist (for instance one a
    /// concurrent fetch just pruned) yields an empty list.
    pub fn latest_commits(&self, branch: &str, limit: usize) -> Result<Vec<SimpleCommit>> {
        let repo = self.open()?;

        let tip = match repo.refname_to_id(&format!("{ORIGIN_PREFIX}{branch}")) {
            Ok(id) => id,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(branch, "remote branch not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(tip)?;

        let mut commits = Vec::with_capacity(limit.min(64));
        for id in walk.take(limit) {
            let id = id?;
            let commit = repo.find_commit(id)?;
            let message = String::from_utf8_lossy(commit.message_bytes());
            commits.push(SimpleCommit::new(&id.to_string(), &message));
        }
        Ok(commits)
    }
}
