//! Terminal UI components for tf.
//!
//! Provides Ayu-themed color styling and terminal detection for CLI output.

pub mod styles;
pub mod terminal;
