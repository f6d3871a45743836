//! colscan CLI library.
//!
//! This module exposes internal types for testing purposes.
//! The main entry point is the `colscan` binary.

pub mod backend;
pub mod cli;
pub mod index;
pub mod keys;
pub mod output;

// Re-export commonly used types
pub use cli::Args;
