//! Traversal project discovery
//!
//! A traversal project (`dirs.proj`, `build.proj`, ...) lists member projects
//! either explicitly or through wildcard includes. The presence of any
//! wildcard `ProjectReference` switches the whole file to glob expansion.

use super::glob_resolver::GlobMemberResolver;
use crate::core::error::{AffectedError, AffectedResult};
use crate::model::ProjectModelProvider;
use crate::paths::{PathComparer, has_wildcard};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves the member projects of a traversal project.
#[derive(Clone)]
pub struct TraversalDiscoverer {
  provider: Arc<dyn ProjectModelProvider>,
  comparer: PathComparer,
  globs: GlobMemberResolver,
  extension: String,
}

impl TraversalDiscoverer {
  /// `extension` is the traversal file extension without the dot (e.g. `proj`)
  pub fn new(
    provider: Arc<dyn ProjectModelProvider>,
    comparer: PathComparer,
    globs: GlobMemberResolver,
    extension: impl Into<String>,
  ) -> Self {
    Self {
      provider,
      comparer,
      globs,
      extension: extension.into(),
    }
  }

  /// Whether `path` looks like a traversal project (by extension only)
  pub fn is_traversal_path(&self, path: &Path) -> bool {
    path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
  }

  /// Absolute paths of the member projects of the traversal project at `path`.
  ///
  /// Explicit members keep evaluation order; glob-based members come back
  /// sorted. A traversal that mixes explicit and wildcard references is
  /// treated as glob-based, so its explicit members are dropped.
  pub fn discover_projects(&self, path: &Path) -> AffectedResult<Vec<PathBuf>> {
    if path.as_os_str().is_empty() {
      return Err(AffectedError::invalid_input("Traversal project path is empty"));
    }
    if !self.is_traversal_path(path) {
      return Err(AffectedError::invalid_input(format!(
        "'{}' is not a traversal project (expected a .{} file)",
        path.display(),
        self.extension
      )));
    }

    let path = self.comparer.canonicalize(path);

    if self.is_glob_based(&path)? {
      tracing::debug!("{} uses wildcard members", path.display());
      let raw = self.provider.open_raw(&path)?;
      return self.globs.resolve(&raw);
    }

    let evaluated = self.provider.evaluate(&path)?;
    let mut seen = HashSet::new();
    let members = evaluated
      .items_of("ProjectReference")
      .map(|item| self.comparer.canonicalize_in(&evaluated.directory, &item.full_path))
      .filter(|member| seen.insert(self.comparer.key(member)))
      .collect();

    Ok(members)
  }

  /// True when any `ProjectReference` include contains a wildcard.
  ///
  /// A file that does not exist is not glob-based; explicit evaluation then
  /// reports it as missing.
  pub fn is_glob_based(&self, path: &Path) -> AffectedResult<bool> {
    if !path.is_file() {
      return Ok(false);
    }
    let raw = self.provider.open_raw(path)?;
    let glob_based = raw
      .items_of("ProjectReference")
      .any(|(_, item)| has_wildcard(&item.include));
    Ok(glob_based)
  }
}
