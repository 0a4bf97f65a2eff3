//! `tf clone` -- create the bare mirror of a repository.

use anyhow::{Context, Result};
use trunkflight_ui::styles::{render_info_icon, render_pass_icon};

use crate::cli::RepoArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf clone` command.
pub fn run(ctx: &RuntimeContext, args: &RepoArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.as_deref())?;
    let mirror = ctx.mirror(repo);

    let _lock = ctx.lock_mirror(&mirror)?;
    let cloned = mirror
        .clone_mirror()
        .with_context(|| format!("failed to clone {}", mirror.git_repo().git_url))?;

    if ctx.json {
        output_json(&serde_json::json!({
            "git_url": mirror.git_repo().git_url,
            "mirror_path": mirror.mirror_path(),
            "cloned": cloned,
        }));
    } else if !ctx.quiet {
        if cloned {
            println!("{} Cloned {}", render_pass_icon(), mirror.git_repo().git_url);
        } else {
            println!("{} Mirror already present", render_info_icon());
        }
        println!("  {}", mirror.mirror_path().display());
    }
    Ok(())
}
