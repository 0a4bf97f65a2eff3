//! `tf list` -- registered repositories and their commands.

use anyhow::{Context, Result};
use trunkflight_storage::Catalog;

use crate::context::RuntimeContext;
use crate::output::{RepoView, format_repo_entry, output_json};

/// Execute the `tf list` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let store = ctx.open_store()?;
    let entries = store
        .list_repo_entries()
        .context("failed to read the catalog")?;

    if ctx.json {
        let views: Vec<RepoView> = entries.iter().map(RepoView::from_entry).collect();
        output_json(&views);
        return Ok(());
    }

    if entries.is_empty() {
        if !ctx.quiet {
            println!("No repositories registered.");
        }
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_repo_entry(entry));
    }
    Ok(())
}
