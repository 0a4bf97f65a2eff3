//! Git plumbing for trunkflight.
//!
//! Bare mirrors of registered repositories ([`MirrorService`]) and
//! disposable worktree sandboxes checked out from them ([`SandboxManager`]).
//! Everything goes through libgit2; no `git` binary is required.
//!
//! Operations against one mirror must be serialized by the caller, for
//! instance by holding a [`MirrorLock`]. Diagnostics are emitted through
//! `tracing`; this crate never installs a subscriber.

pub mod error;
pub mod lock;
pub mod mirror;
pub mod paths;
pub mod registry;
pub mod remote;
pub mod sandbox;

#[cfg(test)]
mod fixture;

pub use error::{GitError, Result};
pub use lock::MirrorLock;
pub use mirror::{DEFAULT_COMMIT_LIMIT, MirrorService};
pub use paths::{canonical_path, ensure_fully_qualified};
pub use registry::{RegisteredSandbox, SandboxRegistry};
pub use remote::probe_remote;
pub use sandbox::{SandboxInfo, SandboxManager};
