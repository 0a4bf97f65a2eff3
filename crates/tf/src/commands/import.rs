//! `tf import` -- register a repository and its run command.

use std::cell::Cell;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use trunkflight_core::{ImportRecord, RepoCommand};
use trunkflight_storage::Catalog;
use trunkflight_ui::styles::render_pass_icon;

use crate::cli::ImportArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf import` command.
pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    let text = read_record(args.file.as_deref())?;
    let record = ImportRecord::parse(&text).context("rejected import record")?;
    let repo = record.to_git_repo().context("rejected import record")?;

    let store = ctx.open_store()?;
    let repo_id = Cell::new(0);
    let command_id = Cell::new(0);
    store
        .run_in_transaction(&|tx| {
            let id = tx.upsert_git_repo(&repo)?;
            repo_id.set(id);
            command_id.set(tx.upsert_repo_command(&RepoCommand::new(id, record.command.as_str()))?);
            Ok(())
        })
        .context("failed to store the import record")?;

    let mirror_path = ctx.data_dir.join(&repo.repo_path);
    tracing::info!(url = %repo.git_url, repo_id = repo_id.get(), command_id = command_id.get(), "imported");

    if ctx.json {
        output_json(&serde_json::json!({
            "git_repo_id": repo_id.get(),
            "repo_command_id": command_id.get(),
            "project": record.project_name,
            "git_url": repo.git_url,
            "repo_path": repo.repo_path,
            "mirror_path": mirror_path,
        }));
    } else if !ctx.quiet {
        println!(
            "{} Registered {} ({}) as repo #{}, command #{}",
            render_pass_icon(),
            record.project_name,
            repo.git_url,
            repo_id.get(),
            command_id.get()
        );
        println!("  mirror: {}", mirror_path.display());
    }
    Ok(())
}

/// Reads the record from `file`, or from stdin for `None` and `-`.
fn read_record(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read the import record from stdin")?;
            Ok(text)
        }
    }
}
