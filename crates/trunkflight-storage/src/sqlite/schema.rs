//! DDL statements for the catalog schema.
//!
//! Table and index names match catalog files written by earlier releases,
//! so existing databases open without conversion. The schema version is
//! tracked in `PRAGMA user_version` rather than in a table of its own.

/// Current schema version. Bumped whenever the DDL changes.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed by `ensure_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Repositories --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS git_repos (
        git_repo_id INTEGER NOT NULL
            CONSTRAINT pk_git_repos PRIMARY KEY AUTOINCREMENT,
        repo_path   TEXT    NOT NULL,
        git_url     TEXT    NOT NULL,
        username    TEXT,
        password    TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ak_git_url ON git_repos (git_url)",
    // -- Run commands --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS repo_commands (
        repo_command_id INTEGER NOT NULL
            CONSTRAINT pk_repo_commands PRIMARY KEY AUTOINCREMENT,
        git_repo_id     INTEGER NOT NULL
            CONSTRAINT fk_repo_commands_git_repos_git_repo_id
                REFERENCES git_repos (git_repo_id)
                ON DELETE CASCADE,
        command         TEXT    NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ak_git_repo_id_command ON repo_commands (git_repo_id, command)",
    "CREATE INDEX IF NOT EXISTS ix_repo_commands_git_repo_id ON repo_commands (git_repo_id)",
];

