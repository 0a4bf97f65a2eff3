//! `tf info` -- where things live and the effective configuration.

use anyhow::{Context, Result};
use trunkflight_ui::styles::render_header;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tf info` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    if ctx.json {
        output_json(&serde_json::json!({
            "data_dir": ctx.data_dir,
            "database": ctx.db_path(),
            "config": ctx.config,
        }));
        return Ok(());
    }

    println!("{}", render_header("Locations"));
    println!("  data dir:  {}", ctx.data_dir.display());
    println!("  database:  {}", ctx.db_path().display());
    println!();
    println!("{}", render_header("Configuration"));
    let yaml = serde_yaml::to_string(&ctx.config).context("failed to render configuration")?;
    for line in yaml.lines() {
        println!("  {line}");
    }
    Ok(())
}
