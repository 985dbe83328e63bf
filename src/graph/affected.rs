//! Affected project analysis
//!
//! Given a set of changed files, determine which projects they touch:
//! - a changed project file touches its own node (direct match)
//! - a changed file in a node's predicted inputs touches that node
//!
//! Each node is reported once, in the order it was first touched.

use super::project_graph::{ProjectGraph, ProjectNode};
use crate::core::error::AffectedResult;
use crate::paths::{PathComparer, PathKey, ends_with_ignore_case, is_project_file};
use crate::prediction::{PredictionCollector, PredictionIndex};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Maps changed files onto graph nodes.
#[derive(Clone)]
pub struct AffectedResolver {
  collector: PredictionCollector,
  comparer: PathComparer,
  excluded_suffixes: Vec<String>,
  /// Relative changed paths resolve against this directory
  base_dir: PathBuf,
}

impl AffectedResolver {
  pub fn new(
    collector: PredictionCollector,
    comparer: PathComparer,
    excluded_suffixes: Vec<String>,
    base_dir: impl Into<PathBuf>,
  ) -> Self {
    Self {
      collector,
      comparer,
      excluded_suffixes,
      base_dir: base_dir.into(),
    }
  }

  /// Whether changes to `path` are ignored entirely
  pub fn is_excluded(&self, path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    self
      .excluded_suffixes
      .iter()
      .any(|suffix| ends_with_ignore_case(&name, suffix))
  }

  /// Projects affected by `changed`, produced lazily.
  ///
  /// Prediction runs up front, so any failure surfaces here rather than
  /// while iterating.
  pub fn resolve<'g>(
    &self,
    graph: &'g ProjectGraph,
    changed: &[impl AsRef<Path>],
  ) -> AffectedResult<AffectedProjects<'g>> {
    let index = self.collector.collect(graph)?;

    let mut files = Vec::with_capacity(changed.len());
    for path in changed {
      let path = path.as_ref();
      if self.is_excluded(path) {
        tracing::debug!("Ignoring change to {}", path.display());
        continue;
      }
      let canonical = self.comparer.canonicalize_in(&self.base_dir, path);
      let key = self.comparer.key_of_canonical(&canonical);
      files.push((canonical, key));
    }

    let direct = graph.nodes().map(|(idx, node)| (node.key.clone(), idx)).collect();

    Ok(AffectedProjects {
      graph,
      index,
      direct,
      changed: files.into_iter(),
      yielded: HashSet::new(),
      pending: VecDeque::new(),
    })
  }
}

/// Lazy sequence of affected projects.
///
/// Finite and single-pass; each node appears at most once.
pub struct AffectedProjects<'g> {
  graph: &'g ProjectGraph,
  index: PredictionIndex,
  direct: HashMap<PathKey, NodeIndex>,
  changed: std::vec::IntoIter<(PathBuf, PathKey)>,
  yielded: HashSet<NodeIndex>,
  /// Nodes touched by the current changed file, not yet returned
  pending: VecDeque<NodeIndex>,
}

impl<'g> Iterator for AffectedProjects<'g> {
  type Item = &'g ProjectNode;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if let Some(idx) = self.pending.pop_front() {
        return Some(self.graph.node(idx));
      }

      let (path, key) = self.changed.next()?;

      if is_project_file(&path)
        && let Some(&idx) = self.direct.get(&key)
        && self.yielded.insert(idx)
      {
        self.pending.push_back(idx);
      }

      for (idx, _) in self.graph.nodes() {
        if self.index.contains(idx, &key) && self.yielded.insert(idx) {
          self.pending.push_back(idx);
        }
      }
    }
  }
}

/// Materialized result for reporting.
#[derive(Debug, Clone)]
pub struct AffectedAnalysis {
  /// Files that changed, as given
  pub changed_files: Vec<PathBuf>,

  /// Affected projects in first-touched order
  pub projects: Vec<ProjectNode>,
}

impl AffectedAnalysis {
  pub fn collect(changed_files: &[impl AsRef<Path>], projects: AffectedProjects<'_>) -> Self {
    Self {
      changed_files: changed_files.iter().map(|p| p.as_ref().to_path_buf()).collect(),
      projects: projects.cloned().collect(),
    }
  }

  pub fn names(&self) -> Vec<String> {
    self.projects.iter().map(ProjectNode::name).collect()
  }
}

/// Resolve and materialize in one step.
pub fn analyze(
  resolver: &AffectedResolver,
  graph: &ProjectGraph,
  changed_files: &[impl AsRef<Path>],
) -> AffectedResult<AffectedAnalysis> {
  let projects = resolver.resolve(graph, changed_files)?;
  Ok(AffectedAnalysis::collect(changed_files, projects))
}
