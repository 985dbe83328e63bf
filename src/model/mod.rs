//! Project model: raw project structure and evaluated projects
//!
//! Core algorithms only see the [`ProjectModelProvider`] trait. The default
//! implementation, [`XmlProjectProvider`], reads project XML from disk.

pub mod condition;
pub mod evaluated;
pub mod raw;
pub mod xml;

pub use evaluated::{EvaluatedProject, ProjectItem};
pub use raw::{RawElement, RawImport, RawItem, RawItemGroup, RawProject};
pub use xml::XmlProjectProvider;

use crate::core::error::AffectedResult;
use std::path::Path;

/// Source of project structure and evaluated project models
pub trait ProjectModelProvider: Send + Sync {
  /// Unevaluated structure of the project file at `path`
  fn open_raw(&self, path: &Path) -> AffectedResult<RawProject>;

  /// Evaluate the project at `path`, including everything it imports
  fn evaluate(&self, path: &Path) -> AffectedResult<EvaluatedProject>;
}
