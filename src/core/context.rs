//! Unified analysis context - build once, pass everywhere
//!
//! # Architecture
//!
//! ```text
//! main.rs:
//!   AnalysisContext::build() -> &AnalysisContext
//!   |
//!   v
//! commands/affected.rs, discover.rs:
//!   fn run_*(ctx: &AnalysisContext, ...)
//! ```
//!
//! The path comparer, host platform, predictor registry and model provider are
//! constructed here exactly once and handed to the components that need them.

use crate::core::config::AffectedConfig;
use crate::core::error::AffectedResult;
use crate::graph::AffectedResolver;
use crate::model::{ProjectModelProvider, XmlProjectProvider};
use crate::paths::PathComparer;
use crate::platform::HostPlatform;
use crate::prediction::{PredictionCollector, PredictorRegistry};
use crate::traversal::{GlobMemberResolver, TraversalDiscoverer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared analysis state for one process.
#[derive(Clone)]
pub struct AnalysisContext {
  /// Repository root (absolute path); relative inputs resolve against it
  pub root: PathBuf,

  /// Loaded configuration (defaults when no file exists)
  pub config: Arc<AffectedConfig>,

  pub comparer: PathComparer,

  pub host: HostPlatform,

  /// Input predictors, output predictor already filtered out
  pub registry: Arc<PredictorRegistry>,

  pub provider: Arc<dyn ProjectModelProvider>,
}

impl AnalysisContext {
  /// Build the context for `root`, loading configuration from it.
  pub fn build(root: &Path) -> AffectedResult<Self> {
    let comparer = PathComparer::host();
    let root = comparer.canonicalize(root);
    let config = AffectedConfig::load(&root)?;
    Ok(Self::with_config(root, config))
  }

  /// Build the context around an already loaded configuration.
  pub fn with_config(root: PathBuf, config: AffectedConfig) -> Self {
    let comparer = PathComparer::host();
    let host = HostPlatform::current();
    let registry = Arc::new(PredictorRegistry::for_inputs(&config.prediction));

    tracing::debug!(
      "Context at {} (host {}, case-sensitive paths: {})",
      root.display(),
      host,
      comparer.is_case_sensitive()
    );

    Self {
      root,
      config: Arc::new(config),
      comparer,
      host,
      registry,
      provider: Arc::new(XmlProjectProvider::new(comparer, host)),
    }
  }

  pub fn glob_resolver(&self) -> GlobMemberResolver {
    GlobMemberResolver::new(
      self.comparer,
      self.host,
      self.config.traversal.default_search_pattern.clone(),
    )
  }

  pub fn discoverer(&self) -> TraversalDiscoverer {
    TraversalDiscoverer::new(
      Arc::clone(&self.provider),
      self.comparer,
      self.glob_resolver(),
      self.config.traversal_extension(),
    )
  }

  pub fn collector(&self) -> PredictionCollector {
    PredictionCollector::new(Arc::clone(&self.registry), self.comparer)
  }

  pub fn resolver(&self) -> AffectedResolver {
    AffectedResolver::new(
      self.collector(),
      self.comparer,
      self.config.affected.excluded_suffixes.clone(),
      self.root.clone(),
    )
  }

  /// Resolve a user-supplied path against the root
  pub fn resolve_path(&self, path: &Path) -> PathBuf {
    self.comparer.canonicalize_in(&self.root, path)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_build_without_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let ctx = AnalysisContext::build(dir.path()).unwrap();
    assert_eq!(*ctx.config, AffectedConfig::default());
    assert!(ctx.root.is_absolute());
    assert_eq!(ctx.resolve_path(Path::new("a/../b.csproj")), ctx.root.join("b.csproj"));
  }

  #[test]
  fn test_build_reads_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
      dir.path().join("affected.toml"),
      "[traversal]\nextension = \"traversal\"\n[prediction]\ndisabled = [\"NoneItemsPredictor\"]\n",
    )
    .unwrap();

    let ctx = AnalysisContext::build(dir.path()).unwrap();
    assert!(ctx.discoverer().is_traversal_path(Path::new("all.traversal")));
    assert!(!ctx.registry.names().contains(&"NoneItemsPredictor"));
  }

  #[test]
  fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("affected.toml"), "[traversal]\nextension = \"\"\n").unwrap();
    assert!(AnalysisContext::build(dir.path()).is_err());
  }
}
