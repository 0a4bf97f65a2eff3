//! `tf remove` -- forget a repository and delete its mirror.
//!
//! The mirror directory and the catalog row are removed independently: a
//! failure of one step is logged and does not stop the other.

use std::io::ErrorKind;

use anyhow::{Result, anyhow};
use tracing::{info, warn};
use trunkflight_storage::Catalog;
use trunkflight_ui::styles::render_pass_icon;

use crate::cli::RemoveArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf remove` command.
pub fn run(ctx: &RuntimeContext, args: &RemoveArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let repo = ctx.resolve_repo(&store, Some(args.repo.as_str()))?;
    let repo_id = repo.id;
    let url = repo.git_url.clone();
    let mirror = ctx.mirror(repo);

    let mut failures: Vec<String> = Vec::new();

    {
        let _lock = ctx.lock_mirror(&mirror)?;
        match std::fs::remove_dir_all(mirror.mirror_path()) {
            Ok(()) => info!(path = %mirror.mirror_path().display(), "mirror deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %mirror.mirror_path().display(), error = %e, "failed to delete mirror");
                failures.push(format!("mirror {}: {e}", mirror.mirror_path().display()));
            }
        }
    }

    match store.delete_git_repo(repo_id) {
        Ok(()) => info!(url = %url, "repository removed from catalog"),
        Err(e) => {
            warn!(url = %url, error = %e, "failed to remove repository from catalog");
            failures.push(format!("catalog: {e}"));
        }
    }

    if !failures.is_empty() {
        return Err(anyhow!("failed to remove {url}: {}", failures.join("; ")));
    }

    if ctx.json {
        output_json(&serde_json::json!({ "removed": url }));
    } else if !ctx.quiet {
        println!("{} Removed {}", render_pass_icon(), url);
    }
    Ok(())
}
