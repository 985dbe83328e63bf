//! Core building blocks shared by every command
//!
//! - **config**: `affected.toml` parsing and validation
//! - **context**: Analysis context built once in main and passed by reference
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: Changed-file discovery via system git

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
