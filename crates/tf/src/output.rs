//! Output formatting helpers for the `tf` CLI.
//!
//! Provides JSON output, table formatting and the view models that shape
//! catalog and sandbox records for display.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;
use trunkflight_core::{RepoEntry, SimpleCommit};
use trunkflight_git::SandboxInfo;
use trunkflight_ui::styles::{render_commit, render_muted, tree_prefix};
use trunkflight_ui::terminal::{terminal_width, truncate_to_width};

/// JSON view of one catalog entry.
///
/// Credentials never leave the catalog; only whether a username is set is
/// reported.
#[derive(Serialize)]
pub struct RepoView {
    pub id: i64,
    pub git_url: String,
    pub repo_path: String,
    pub has_credentials: bool,
    pub commands: Vec<CommandView>,
}

#[derive(Serialize)]
pub struct CommandView {
    pub id: i64,
    pub command: String,
}

impl RepoView {
    pub fn from_entry(entry: &RepoEntry) -> Self {
        Self {
            id: entry.repo.id,
            git_url: entry.repo.git_url.clone(),
            repo_path: entry.repo.repo_path.clone(),
            has_credentials: entry.repo.username.is_some(),
            commands: entry
                .commands
                .iter()
                .map(|c| CommandView {
                    id: c.id,
                    command: c.command.clone(),
                })
                .collect(),
        }
    }
}

/// JSON view of a sandbox.
#[derive(Serialize)]
pub struct SandboxView {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
}

impl From<&SandboxInfo> for SandboxView {
    fn from(info: &SandboxInfo) -> Self {
        Self {
            name: info.name.clone(),
            path: info.path.clone(),
            exists: info.exists,
        }
    }
}

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Each row is a `Vec<String>` with columns matching the headers.
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for (i, header) in headers.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{:<width$}", header, width = widths[i]);
    }
    let _ = writeln!(handle);

    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            let _ = write!(handle, "  ");
        }
        let _ = write!(handle, "{}", "-".repeat(*width));
    }
    let _ = writeln!(handle);

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                let _ = write!(handle, "  ");
            }
            if i < widths.len() {
                let _ = write!(handle, "{:<width$}", cell, width = widths[i]);
            } else {
                let _ = write!(handle, "{}", cell);
            }
        }
        let _ = writeln!(handle);
    }
}

/// Formats a catalog entry as a repository line followed by a tree of its
/// commands. Long command lines are cut at the terminal width.
pub fn format_repo_entry(entry: &RepoEntry) -> String {
    let room = terminal_width().saturating_sub(5).max(20);
    let mut lines = vec![format!(
        "{} {}",
        entry.repo.git_url,
        render_muted(&format!("[{}]", entry.repo.repo_path))
    )];
    let len = entry.commands.len();
    for (i, cmd) in entry.commands.iter().enumerate() {
        lines.push(format!(
            "  {}{}",
            tree_prefix(i, len),
            truncate_to_width(&cmd.command, room)
        ));
    }
    lines.join("\n")
}

/// One line per commit, newest first.
pub fn format_commits(commits: &[SimpleCommit]) -> String {
    commits
        .iter()
        .map(render_commit)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Table row for a sandbox.
pub fn format_sandbox_row(info: &SandboxInfo) -> Vec<String> {
    vec![
        info.name.clone(),
        info.path.display().to_string(),
        if info.exists { "yes" } else { "missing" }.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use pretty_assertions::assert_eq;
    use trunkflight_core::{GitRepo, RepoCommand};

    fn entry() -> RepoEntry {
        let mut repo = GitRepo::new("https://git.example.com/app.git", "src/https/git.example.com/app.git")
            .with_credentials("alice", "secret");
        repo.id = 3;
        let repo = Arc::new(repo);
        let mut build = RepoCommand::new(3, "make build");
        build.id = 8;
        build.git_repo = Some(Arc::clone(&repo));
        let mut test = RepoCommand::new(3, "make test");
        test.id = 5;
        test.git_repo = Some(Arc::clone(&repo));
        RepoEntry {
            repo,
            commands: vec![build, test],
        }
    }

    #[test]
    fn repo_view_hides_password() {
        let json = serde_json::to_value(RepoView::from_entry(&entry())).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["has_credentials"], true);
        assert_eq!(json["commands"][0]["command"], "make build");
        assert!(!json.to_string().contains("secret"));
    }

    #[test]
    fn repo_entry_lists_commands() {
        let text = format_repo_entry(&entry());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("https://git.example.com/app.git"));
        assert!(lines[1].ends_with("make build"));
        assert!(lines[2].ends_with("make test"));
    }

    #[test]
    fn sandbox_row_marks_missing_directories() {
        let info = SandboxInfo {
            name: "01J".into(),
            path: PathBuf::from("/tmp/gone"),
            exists: false,
        };
        assert_eq!(format_sandbox_row(&info)[2], "missing");
    }

    #[test]
    fn table_output_smoke() {
        let headers = &["NAME", "PATH"];
        let rows = vec![vec!["a".into(), "/tmp/a".into()]];
        output_table(headers, &rows);
    }
}
