//! Throwaway upstream repositories for tests.

use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use tempfile::TempDir;
use trunkflight_core::GitRepo;
use url::Url;

/// A bare "remote" repository in a temp directory, reachable via `file://`.
pub(crate) struct Upstream {
    pub dir: TempDir,
    pub repo: Repository,
}

impl Upstream {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.bare(true).initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        Self { dir, repo }
    }

    /// `main`: initial (t=1000), second on main (t=3000);
    /// `dev` forked from initial: dev work (t=2000).
    pub fn with_history() -> Self {
        let up = Self::new();
        let initial = up.commit("main", "README.md", "hello\n", "initial", 1000);
        up.branch_at("dev", initial);
        up.commit("dev", "dev.txt", "dev\n", "dev work", 2000);
        up.commit("main", "README.md", "hello again\n", "second on main\n\nbody", 3000);
        up
    }

    pub fn url(&self) -> String {
        Url::from_directory_path(self.dir.path())
            .unwrap()
            .to_string()
            .trim_end_matches('/')
            .to_string()
    }

    pub fn git_repo(&self) -> GitRepo {
        GitRepo::new(self.url(), "src/file/upstream")
    }

    /// Commits `file` with `content` on top of `branch`, creating the branch
    /// when it does not exist yet.
    pub fn commit(&self, branch: &str, file: &str, content: &str, message: &str, time: i64) -> Oid {
        let refname = format!("refs/heads/{branch}");
        let parent = self
            .repo
            .find_reference(&refname)
            .ok()
            .map(|r| r.peel_to_commit().unwrap());

        let base = parent.as_ref().map(|c| c.tree().unwrap());
        let mut builder = self.repo.treebuilder(base.as_ref()).unwrap();
        let blob = self.repo.blob(content.as_bytes()).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let sig = Signature::new("Test", "test@example.com", &Time::new(time, 0)).unwrap();
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    pub fn branch_at(&self, branch: &str, at: Oid) {
        let commit = self.repo.find_commit(at).unwrap();
        self.repo.branch(branch, &commit, false).unwrap();
    }

    pub fn delete_branch(&self, branch: &str) {
        self.repo
            .find_branch(branch, git2::BranchType::Local)
            .unwrap()
            .delete()
            .unwrap();
    }
}

/// Lists local branch names of the repository at `path`.
pub(crate) fn local_branches(path: &Path) -> Vec<String> {
    let repo = Repository::open(path).unwrap();
    let mut names: Vec<String> = repo
        .branches(Some(git2::BranchType::Local))
        .unwrap()
        .map(|b| b.unwrap().0.name().unwrap().unwrap().to_string())
        .collect();
    names.sort();
    names
}
