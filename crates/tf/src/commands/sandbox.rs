//! `tf sandbox` -- add, remove and list sandboxes of a mirror.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trunkflight_git::SandboxManager;
use trunkflight_ui::styles::render_pass_icon;
use ulid::Ulid;

use crate::cli::{RepoArgs, SandboxAddArgs, SandboxArgs, SandboxCommands, SandboxRemoveArgs};
use crate::context::RuntimeContext;
use crate::output::{SandboxView, format_sandbox_row, output_json, output_table};

/// Execute the `tf sandbox` command.
pub fn run(ctx: &RuntimeContext, args: &SandboxArgs) -> Result<()> {
    match &args.command {
        SandboxCommands::Add(a) => run_add(ctx, a),
        SandboxCommands::Remove(a) => run_remove(ctx, a),
        SandboxCommands::List(a) => run_list(ctx, a),
    }
}

fn run_add(ctx: &RuntimeContext, args: &SandboxAddArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.repo.as_deref())?;
    let mirror = ctx.mirror(repo);

    let target = match &args.path {
        Some(p) => absolute(p)?,
        None => default_sandbox_path(ctx),
    };

    {
        let _lock = ctx.lock_mirror(&mirror)?;
        SandboxManager::for_mirror(&mirror)
            .add(&target, &args.committish)
            .with_context(|| format!("failed to check out {} into {}", args.committish, target.display()))?;
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "path": target,
            "committish": args.committish,
        }));
    } else if ctx.quiet {
        println!("{}", target.display());
    } else {
        println!("{} Checked out {}", render_pass_icon(), args.committish);
        println!("{}", target.display());
    }
    Ok(())
}

fn run_remove(ctx: &RuntimeContext, args: &SandboxRemoveArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.repo.as_deref())?;
    let mirror = ctx.mirror(repo);
    let target = absolute(&args.path)?;

    {
        let _lock = ctx.lock_mirror(&mirror)?;
        SandboxManager::for_mirror(&mirror)
            .remove(&target)
            .with_context(|| format!("failed to remove sandbox {}", target.display()))?;
    }

    if ctx.json {
        output_json(&serde_json::json!({ "removed": target }));
    } else if !ctx.quiet {
        println!("{} Removed {}", render_pass_icon(), target.display());
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, args: &RepoArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, args.repo.as_deref())?;
    let mirror = ctx.mirror(repo);

    let sandboxes = {
        let _lock = ctx.lock_mirror(&mirror)?;
        SandboxManager::for_mirror(&mirror).list()
    };

    if ctx.json {
        let views: Vec<SandboxView> = sandboxes.iter().map(SandboxView::from).collect();
        output_json(&views);
    } else if sandboxes.is_empty() {
        if !ctx.quiet {
            println!("No sandboxes.");
        }
    } else {
        let rows: Vec<Vec<String>> = sandboxes.iter().map(format_sandbox_row).collect();
        output_table(&["NAME", "PATH", "PRESENT"], &rows);
    }
    Ok(())
}

/// `<temp dir>/<sandbox_prefix><ULID>`; unique per call.
pub(crate) fn default_sandbox_path(ctx: &RuntimeContext) -> PathBuf {
    std::env::temp_dir().join(format!("{}{}", ctx.config.sandbox_prefix, Ulid::new()))
}

/// Sandbox paths given on the command line are taken relative to the
/// working directory.
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::cli::GlobalArgs;

    #[test]
    fn default_paths_are_unique_and_prefixed() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = RuntimeContext::from_global_args(
            &GlobalArgs {
                json: false,
                verbose: false,
                quiet: true,
                data_dir: Some(tmp.path().to_path_buf()),
            },
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        let a = default_sandbox_path(&ctx);
        let b = default_sandbox_path(&ctx);
        assert_ne!(a, b);
        assert!(a.is_absolute());
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&ctx.config.sandbox_prefix));
    }
}
