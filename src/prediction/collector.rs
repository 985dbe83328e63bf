//! Per-node predicted input index
//!
//! Runs every registered predictor against every graph node and folds the
//! predicted input files into one set per node. Output predictions are
//! dropped. Nodes are processed in parallel; the first failure aborts.

use super::predictor::Predictions;
use super::registry::PredictorRegistry;
use crate::core::error::AffectedResult;
use crate::graph::ProjectGraph;
use crate::paths::{PathComparer, PathKey};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Predicted input files of every node, keyed canonically.
#[derive(Debug, Default, Clone)]
pub struct PredictionIndex {
  inputs: HashMap<NodeIndex, HashSet<PathKey>>,
}

impl PredictionIndex {
  pub fn contains(&self, node: NodeIndex, key: &PathKey) -> bool {
    self.inputs.get(&node).is_some_and(|set| set.contains(key))
  }
}

/// Builds a [`PredictionIndex`] for a graph.
#[derive(Clone)]
pub struct PredictionCollector {
  registry: Arc<PredictorRegistry>,
  comparer: PathComparer,
}

impl PredictionCollector {
  pub fn new(registry: Arc<PredictorRegistry>, comparer: PathComparer) -> Self {
    Self { registry, comparer }
  }

  pub fn collect(&self, graph: &ProjectGraph) -> AffectedResult<PredictionIndex> {
    let nodes: Vec<NodeIndex> = graph.nodes().map(|(idx, _)| idx).collect();

    let results: Vec<AffectedResult<(NodeIndex, HashSet<PathKey>)>> = nodes
      .into_par_iter()
      .map(|idx| self.predict_node(graph, idx).map(|set| (idx, set)))
      .collect();

    let mut inputs = HashMap::with_capacity(results.len());
    for result in results {
      let (idx, set) = result?;
      inputs.insert(idx, set);
    }

    tracing::debug!(
      "Predicted {} inputs across {} projects",
      inputs.values().map(HashSet::len).sum::<usize>(),
      inputs.len()
    );

    Ok(PredictionIndex { inputs })
  }

  fn predict_node(&self, graph: &ProjectGraph, idx: NodeIndex) -> AffectedResult<HashSet<PathKey>> {
    let node = graph.node(idx);
    let mut predictions = Predictions::default();

    for predictor in self.registry.project_predictors() {
      predictor.predict(&node.model, &mut predictions)?;
    }
    for predictor in self.registry.graph_predictors() {
      predictor.predict(graph, idx, &mut predictions)?;
    }

    let set = predictions
      .input_files
      .iter()
      .map(|path| self.key_for(&node.model.directory, path))
      .collect();
    Ok(set)
  }

  fn key_for(&self, project_dir: &Path, path: &Path) -> PathKey {
    self.comparer.key_of_canonical(&self.comparer.canonicalize_in(project_dir, path))
  }
}
