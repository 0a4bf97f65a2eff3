//! Clap CLI definitions for the `tf` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tf -- repository mirrors and disposable sandboxes.
///
/// Keeps bare mirrors of registered git repositories in the user data
/// directory and checks out throwaway worktrees from them to run commands in.
#[derive(Parser, Debug)]
#[command(
    name = "tf",
    about = "Repository mirrors and disposable sandboxes",
    long_about = "Keeps bare mirrors of registered git repositories and checks out throwaway worktrees from them to run commands in.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Data directory holding mirrors, the catalog and config.yaml.
    #[arg(long, global = true, env = "TRUNKFLIGHT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // ===== Catalog =====
    /// Register a repository and its run command from an import record.
    Import(ImportArgs),

    /// List registered repositories and their commands.
    #[command(alias = "ls")]
    List,

    /// Forget a repository and delete its mirror.
    Remove(RemoveArgs),

    // ===== Mirrors =====
    /// Clone the mirror of a repository (no-op if present).
    #[command(name = "clone")]
    CloneCmd(RepoArgs),

    /// Fetch and prune the mirror of a repository.
    Fetch(FetchArgs),

    /// List remote branches, most recently committed first.
    Branches(RepoArgs),

    /// Show the latest commits of a branch.
    Commits(CommitsArgs),

    // ===== Sandboxes =====
    /// Manage sandboxes (worktrees checked out from a mirror).
    Sandbox(SandboxArgs),

    /// Run the repository's command in a fresh sandbox.
    Run(RunArgs),

    // ===== Setup =====
    /// Show data directory, database path and effective configuration.
    Info,

    /// Generate shell completion scripts.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// Argument structs
// ---------------------------------------------------------------------------

/// Selects a registered repository.
#[derive(Args, Debug, Clone, Default)]
pub struct RepoArgs {
    /// Repository URL (default: repository of the most recently added command).
    #[arg(long)]
    pub repo: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Repository URL. Required: removal never picks a default.
    #[arg(long)]
    pub repo: String,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Import record file (`key=value` lines). Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Skip the reachability check of HTTP(S) remotes.
    #[arg(long)]
    pub skip_probe: bool,
}

#[derive(Args, Debug)]
pub struct CommitsArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Branch under origin (default: most recently committed branch).
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// Maximum number of commits (default: `commit_limit` from config).
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SandboxArgs {
    #[command(subcommand)]
    pub command: SandboxCommands,
}

#[derive(Subcommand, Debug)]
pub enum SandboxCommands {
    /// Check out a committish into a new sandbox.
    Add(SandboxAddArgs),

    /// Delete a sandbox.
    #[command(alias = "rm")]
    Remove(SandboxRemoveArgs),

    /// List the sandboxes of a mirror.
    #[command(alias = "ls")]
    List(RepoArgs),
}

#[derive(Args, Debug)]
pub struct SandboxAddArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Branch name under origin, commit hash or tag.
    pub committish: String,

    /// Sandbox directory (default: a fresh directory under the temp dir).
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SandboxRemoveArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Sandbox directory.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Command line to run (default: the most recently added command of the repository).
    #[arg(long, short = 'c')]
    pub command: Option<String>,

    /// What to check out (default: newest commit of the newest branch).
    pub committish: Option<String>,

    /// Keep the sandbox instead of deleting it afterwards.
    #[arg(long)]
    pub keep: bool,
}

#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate bash completion script.
    Bash,
    /// Generate zsh completion script.
    Zsh,
    /// Generate fish completion script.
    Fish,
    /// Generate PowerShell completion script.
    Powershell,
}
