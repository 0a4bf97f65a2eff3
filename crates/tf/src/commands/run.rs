//! `tf run` -- run a repository's command in a fresh sandbox.
//!
//! Updates the mirror, checks out the requested committish (by default the
//! tip of the most recently committed branch), runs the command through the
//! platform shell inside the sandbox with inherited stdio, and finally tears
//! down every sandbox this process created. A Ctrl+C during the update stops
//! the run before any sandbox exists.

use std::path::Path;
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};
use trunkflight_core::GitRepo;
use trunkflight_git::{SandboxManager, SandboxRegistry, probe_remote};
use trunkflight_storage::Catalog;
use trunkflight_ui::styles::{render_accent, render_muted};

use crate::cli::RunArgs;
use crate::commands::fetch::update_mirror;
use crate::commands::sandbox::default_sandbox_path;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf run` command.
pub fn run(ctx: &RuntimeContext, args: &RunArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.repo.as_deref())?;
    let command = match &args.command {
        Some(c) => c.clone(),
        None => latest_command_of(&store, &repo)?,
    };
    let mirror = ctx.mirror(repo);
    let url = mirror.git_repo().git_url.clone();

    let registry = Arc::new(SandboxRegistry::new());
    let manager = SandboxManager::for_mirror(&mirror).with_registry(Arc::clone(&registry));
    let target = default_sandbox_path(ctx);

    let committish = {
        let _lock = ctx.lock_mirror(&mirror)?;
        if mirror.exists() && !probe_remote(&url, ctx.probe_timeout()) {
            warn!(url = %url, "remote unreachable, using the mirror as is");
        } else {
            update_mirror(&mirror)?;
        }
        if ctx.cancel.load(Ordering::SeqCst) {
            bail!("cancelled, no sandbox created");
        }

        let committish = match &args.committish {
            Some(c) => c.clone(),
            None => mirror
                .remote_branch_names()
                .with_context(|| format!("failed to list branches of {url}"))?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("{url} has no remote branches"))?,
        };
        manager
            .add(&target, &committish)
            .with_context(|| format!("failed to check out {committish}"))?;
        committish
    };

    if !ctx.quiet && !ctx.json {
        eprintln!(
            "{} {} {}",
            render_accent(&command),
            render_muted("in"),
            target.display()
        );
    }
    let status = run_in_shell(&command, &target);

    if args.keep {
        info!(target = %target.display(), "keeping sandbox");
    } else {
        let _lock = ctx.lock_mirror(&mirror)?;
        registry.remove_all();
    }

    let status = status.with_context(|| format!("failed to start `{command}`"))?;
    if ctx.json {
        output_json(&serde_json::json!({
            "git_url": url,
            "committish": committish,
            "command": command,
            "sandbox": target,
            "kept": args.keep,
            "exit_code": status.code(),
        }));
    }
    if !status.success() {
        bail!("`{command}` failed ({status})");
    }
    Ok(())
}

/// The most recently added command of `repo`.
fn latest_command_of(store: &dyn Catalog, repo: &GitRepo) -> Result<String> {
    store
        .list_repo_entries()
        .context("failed to read the catalog")?
        .into_iter()
        .find(|entry| entry.repo.id == repo.id)
        .and_then(|entry| entry.commands.into_iter().next())
        .map(|cmd| cmd.command)
        .ok_or_else(|| anyhow!("{} has no command; pass --command", repo.git_url))
}

/// Runs `command` through the platform shell with `dir` as working
/// directory, streaming its output.
fn run_in_shell(command: &str, dir: &Path) -> std::io::Result<ExitStatus> {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    cmd.current_dir(dir).status()
}
