//! `tf commits` -- latest commits of a remote branch.

use anyhow::{Context, Result, anyhow, bail};
use trunkflight_ui::styles::{render_branch, render_header};

use crate::cli::CommitsArgs;
use crate::context::RuntimeContext;
use crate::output::{format_commits, output_json};

/// Execute the `tf commits` command.
pub fn run(ctx: &RuntimeContext, args: &CommitsArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(ctx.config.commit_limit);
    if limit == 0 {
        bail!("--limit must be at least 1");
    }

    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.repo.as_deref())?;
    let mirror = ctx.mirror(repo);
    let url = mirror.git_repo().git_url.clone();

    let (branch, commits) = {
        let _lock = ctx.lock_mirror(&mirror)?;
        let branch = match &args.branch {
            Some(b) => b.clone(),
            None => mirror
                .remote_branch_names()
                .with_context(|| format!("failed to list branches of {url}"))?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("{url} has no remote branches"))?,
        };
        let commits = mirror
            .latest_commits(&branch, limit)
            .with_context(|| format!("failed to read commits of {branch}"))?;
        (branch, commits)
    };

    if ctx.json {
        output_json(&serde_json::json!({
            "branch": branch,
            "commits": commits,
        }));
        return Ok(());
    }

    if !ctx.quiet {
        println!("{} {}", render_header("Branch"), render_branch(&branch));
    }
    if !commits.is_empty() {
        println!("{}", format_commits(&commits));
    }
    Ok(())
}
