//! Configuration management for trunkflight.
//!
//! This crate resolves the per-user data directory that holds mirrors and
//! the catalog database, and loads the layered [`TrunkflightConfig`]
//! (built-in defaults, `config.yaml`, `TRUNKFLIGHT_*` environment).

pub mod config;
pub mod data_dir;

pub use config::{ConfigError, Result, TrunkflightConfig, load_config, save_config};
pub use data_dir::{resolve_data_dir, user_data_dir};
