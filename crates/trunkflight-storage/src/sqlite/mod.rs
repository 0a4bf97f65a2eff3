//! SQLite-backed catalog implementation.

mod git_repos;
mod repo_commands;
pub mod schema;
mod store;
mod transaction;

pub use store::SqliteStore;
