//! `tf fetch` -- bring a mirror up to date.
//!
//! HTTP(S) remotes are probed first so an unreachable host fails fast
//! instead of waiting on libgit2's own timeouts. A missing mirror is
//! cloned instead of fetched.

use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use trunkflight_git::{MirrorService, probe_remote};
use trunkflight_ui::styles::{render_pass_icon, render_warn_icon};

use crate::cli::FetchArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf fetch` command.
pub fn run(ctx: &RuntimeContext, args: &FetchArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.repo.as_deref())?;
    let mirror = ctx.mirror(repo);

    if !args.skip_probe && !probe_remote(&mirror.git_repo().git_url, ctx.probe_timeout()) {
        bail!("remote {} is not reachable", mirror.git_repo().git_url);
    }

    let _lock = ctx.lock_mirror(&mirror)?;
    let cloned = update_mirror(&mirror)?;
    let cancelled = ctx.cancel.load(Ordering::SeqCst);

    if ctx.json {
        output_json(&serde_json::json!({
            "git_url": mirror.git_repo().git_url,
            "mirror_path": mirror.mirror_path(),
            "cloned": cloned,
            "cancelled": cancelled,
        }));
    } else if !ctx.quiet {
        if cancelled {
            println!("{} Fetch cancelled", render_warn_icon());
        } else if cloned {
            println!("{} Cloned {}", render_pass_icon(), mirror.git_repo().git_url);
        } else {
            println!("{} Fetched {}", render_pass_icon(), mirror.git_repo().git_url);
        }
    }
    Ok(())
}

/// Clones a missing mirror, fetches an existing one. Returns whether a
/// clone happened. The caller holds the mirror lock.
pub(crate) fn update_mirror(mirror: &MirrorService) -> Result<bool> {
    let url = &mirror.git_repo().git_url;
    if !mirror.exists() {
        return mirror
            .clone_mirror()
            .with_context(|| format!("failed to clone {url}"));
    }
    mirror
        .fetch()
        .with_context(|| format!("failed to fetch {url}"))?;
    Ok(false)
}
