//! `tf branches` -- remote branches, most recently committed first.

use anyhow::{Context, Result};
use trunkflight_ui::styles::render_branch;

use crate::cli::RepoArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf branches` command.
pub fn run(ctx: &RuntimeContext, args: &RepoArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.as_deref())?;
    let mirror = ctx.mirror(repo);

    let branches = {
        let _lock = ctx.lock_mirror(&mirror)?;
        mirror
            .remote_branch_names()
            .with_context(|| format!("failed to list branches of {}", mirror.git_repo().git_url))?
    };

    if ctx.json {
        output_json(&branches);
    } else {
        for branch in &branches {
            println!("{}", render_branch(branch));
        }
    }
    Ok(())
}
