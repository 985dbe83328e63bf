//! Predictor contracts
//!
//! A predictor proposes files a project reads (inputs) or writes (outputs)
//! without running a build. Predictions are a best-effort superset: missing
//! an input is tolerated, inventing one is not.

use crate::core::error::AffectedResult;
use crate::graph::ProjectGraph;
use crate::model::EvaluatedProject;
use petgraph::graph::NodeIndex;
use std::path::PathBuf;

/// Collected predictions for one project.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Predictions {
  pub input_files: Vec<PathBuf>,
  pub output_directories: Vec<PathBuf>,
}

impl Predictions {
  pub fn add_input_file(&mut self, path: PathBuf) {
    self.input_files.push(path);
  }

  pub fn add_output_directory(&mut self, path: PathBuf) {
    self.output_directories.push(path);
  }
}

/// Predicts from a single evaluated project.
pub trait ProjectPredictor: Send + Sync {
  fn name(&self) -> &'static str;

  fn predict(&self, project: &EvaluatedProject, predictions: &mut Predictions) -> AffectedResult<()>;
}

/// Predicts from a project's position in the graph.
pub trait GraphPredictor: Send + Sync {
  fn name(&self) -> &'static str;

  fn predict(&self, graph: &ProjectGraph, node: NodeIndex, predictions: &mut Predictions) -> AffectedResult<()>;
}
