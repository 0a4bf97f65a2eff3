//! Command handlers, one module per subcommand.

pub mod branches;
pub mod clone;
pub mod commits;
pub mod completion;
pub mod fetch;
pub mod import;
pub mod info;
pub mod list;
pub mod remove;
pub mod run;
pub mod sandbox;
