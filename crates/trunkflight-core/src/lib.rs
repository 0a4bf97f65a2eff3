//! Core types for the trunkflight repository and sandbox manager.
//!
//! Holds the catalog records, the URL-to-storage-path mapping and the
//! import-record parser. Nothing here touches git or the database.

pub mod commit;
pub mod import;
pub mod repo;
pub mod repo_path;

pub use commit::SimpleCommit;
pub use import::{ImportError, ImportRecord};
pub use repo::{GitRepo, RepoCommand, RepoEntry, group_by_repo};
pub use repo_path::{RepoPathError, generate_repo_path, is_http_url};
