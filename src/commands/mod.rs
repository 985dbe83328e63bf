//! CLI commands for msbuild-affected
//!
//! - **affected**: Find the projects affected by a set of changed files
//! - **discover**: List the member projects of a traversal project
//!
//! All commands accept `&AnalysisContext` so config and collaborators load once.

pub mod affected;
pub mod discover;

pub use affected::{ChangeSource, run_affected};
pub use discover::run_discover;

use crate::core::error::{AffectedError, AffectedResult};
use std::path::Path;

/// Output format shared by all commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  Names,
}

impl OutputFormat {
  pub fn parse(s: &str) -> AffectedResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::Names),
      _ => Err(AffectedError::with_help(
        format!("Unknown format '{}'", s),
        "Valid formats: text, json, names",
      )),
    }
  }
}

/// `path` relative to `root` when it lives under it, `/`-separated
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
  let shown = match path.strip_prefix(root) {
    Ok(relative) => relative.to_path_buf(),
    Err(_) => pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf()),
  };
  shown.to_string_lossy().replace('\\', "/")
}
