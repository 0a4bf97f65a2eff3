//! `tf` -- repository mirrors and disposable sandboxes.
//!
//! Parses CLI arguments with clap, resolves the runtime context, installs
//! the log subscriber and dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Crates whose events `-v` turns up to debug.
const VERBOSE_FILTER: &str =
    "tf=debug,trunkflight_core=debug,trunkflight_storage=debug,trunkflight_config=debug,trunkflight_git=debug";

fn main() {
    // First Ctrl+C: ask running transfers to stop. Second: force exit.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let _ = ctrlc::set_handler(move || {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("Cancelling... press Ctrl+C again to exit immediately.");
        flag.store(true, Ordering::SeqCst);
    });

    let cli = Cli::parse();

    // Completion scripts need no data directory.
    if let Some(Commands::Completion(args)) = &cli.command {
        commands::completion::run(args);
        return;
    }

    let result = RuntimeContext::from_global_args(&cli.global, cancel).and_then(|ctx| {
        init_logging(&ctx);
        dispatch(&ctx, cli.command)
    });

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn dispatch(ctx: &RuntimeContext, command: Option<Commands>) -> anyhow::Result<()> {
    match command {
        Some(Commands::Import(args)) => commands::import::run(ctx, &args),
        Some(Commands::List) => commands::list::run(ctx),
        Some(Commands::Remove(args)) => commands::remove::run(ctx, &args),
        Some(Commands::CloneCmd(args)) => commands::clone::run(ctx, &args),
        Some(Commands::Fetch(args)) => commands::fetch::run(ctx, &args),
        Some(Commands::Branches(args)) => commands::branches::run(ctx, &args),
        Some(Commands::Commits(args)) => commands::commits::run(ctx, &args),
        Some(Commands::Sandbox(args)) => commands::sandbox::run(ctx, &args),
        Some(Commands::Run(args)) => commands::run::run(ctx, &args),
        Some(Commands::Info) => commands::info::run(ctx),
        Some(Commands::Completion(args)) => {
            commands::completion::run(&args);
            Ok(())
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    }
}

/// Installs the stderr log subscriber.
///
/// `-v` wins over `-q`, which wins over `RUST_LOG`, which wins over the
/// configured `log_filter`.
fn init_logging(ctx: &RuntimeContext) {
    let filter = if ctx.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if ctx.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&ctx.config.log_filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
