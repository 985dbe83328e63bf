//! Project graph built from evaluated projects + petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A references B" (`ProjectReference`)
//! - **Nodes**: one per distinct project file, keyed by canonical path
//! - **Order**: nodes are added in breadth-first discovery order from the
//!   entry points; node index order is the graph order used by every query

use crate::core::context::AnalysisContext;
use crate::core::error::AffectedResult;
use crate::model::{EvaluatedProject, ProjectModelProvider};
use crate::paths::{PathComparer, PathKey};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A project in the graph.
#[derive(Debug, Clone)]
pub struct ProjectNode {
  /// Absolute project file path
  pub path: PathBuf,
  pub key: PathKey,
  pub model: Arc<EvaluatedProject>,
}

impl ProjectNode {
  pub fn name(&self) -> String {
    self.model.name()
  }
}

/// Project reference graph.
pub struct ProjectGraph {
  graph: DiGraph<ProjectNode, ()>,
  key_to_node: HashMap<PathKey, NodeIndex>,
  entry_points: Vec<NodeIndex>,
  comparer: PathComparer,
}

impl ProjectGraph {
  /// Build the graph for `root`.
  ///
  /// A traversal project is expanded into its members first; any other
  /// project is the single entry point.
  pub fn load(ctx: &AnalysisContext, root: &Path) -> AffectedResult<Self> {
    let discoverer = ctx.discoverer();
    let entry_points = if discoverer.is_traversal_path(root) {
      let members = discoverer.discover_projects(root)?;
      tracing::info!("{} lists {} member projects", root.display(), members.len());
      members
    } else {
      vec![ctx.comparer.canonicalize(root)]
    };

    Self::build(ctx.provider.as_ref(), ctx.comparer, &entry_points)
  }

  /// Evaluate every project reachable from `entry_points` once and link references.
  pub fn build(
    provider: &dyn ProjectModelProvider,
    comparer: PathComparer,
    entry_points: &[PathBuf],
  ) -> AffectedResult<Self> {
    let mut graph = DiGraph::new();
    let mut key_to_node = HashMap::new();
    let mut references: Vec<(NodeIndex, Vec<PathKey>)> = Vec::new();

    let mut queued = HashSet::new();
    let mut queue = VecDeque::new();
    for path in entry_points {
      let path = comparer.canonicalize(path);
      if queued.insert(comparer.key_of_canonical(&path)) {
        queue.push_back((path, None::<PathBuf>));
      }
    }

    while let Some((path, referrer)) = queue.pop_front() {
      let model = provider.evaluate(&path).inspect_err(|_| {
        if let Some(referrer) = &referrer {
          tracing::error!("Failed to load {} referenced by {}", path.display(), referrer.display());
        }
      })?;

      let key = comparer.key_of_canonical(&path);
      let mut refs = Vec::new();
      for item in model.items_of("ProjectReference") {
        let target = comparer.canonicalize_in(&model.directory, &item.full_path);
        let target_key = comparer.key_of_canonical(&target);
        if queued.insert(target_key.clone()) {
          queue.push_back((target, Some(path.clone())));
        }
        refs.push(target_key);
      }

      let idx = graph.add_node(ProjectNode {
        path,
        key: key.clone(),
        model: Arc::new(model),
      });
      key_to_node.insert(key, idx);
      references.push((idx, refs));
    }

    // Edges once every node exists
    for (from, targets) in references {
      for target in targets {
        if let Some(&to) = key_to_node.get(&target) {
          graph.update_edge(from, to, ());
        }
      }
    }

    let mut entries: Vec<NodeIndex> = Vec::new();
    for idx in entry_points.iter().filter_map(|path| key_to_node.get(&comparer.key(path)).copied()) {
      if !entries.contains(&idx) {
        entries.push(idx);
      }
    }

    tracing::debug!("Project graph: {} nodes, {} edges", graph.node_count(), graph.edge_count());

    Ok(Self {
      graph,
      key_to_node,
      entry_points: entries,
      comparer,
    })
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// All nodes in graph order
  pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &ProjectNode)> {
    self.graph.node_indices().map(move |idx| (idx, &self.graph[idx]))
  }

  pub fn node(&self, idx: NodeIndex) -> &ProjectNode {
    &self.graph[idx]
  }

  /// Node whose project file is `path`
  pub fn find(&self, path: &Path) -> Option<NodeIndex> {
    self.key_to_node.get(&self.comparer.key(path)).copied()
  }

  /// Every node reachable through references, excluding `idx` itself.
  pub fn transitive_references(&self, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut reachable = Vec::new();
    let mut bfs = Bfs::new(&self.graph, idx);
    while let Some(next) = bfs.next(&self.graph) {
      if next != idx {
        reachable.push(next);
      }
    }
    reachable.sort();
    reachable
  }

  /// Nodes the graph was built from
  pub fn entry_points(&self) -> &[NodeIndex] {
    &self.entry_points
  }
}
