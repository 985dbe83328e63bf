//! Predictor registry, built once at startup

use super::catalog::{self, OUTPUT_DIRECTORY_PREDICTOR, ProjectFileAndImportsGraphPredictor};
use super::predictor::{GraphPredictor, ProjectPredictor};
use crate::core::config::PredictionConfig;
use std::sync::Arc;

/// The predictors input collection runs.
#[derive(Clone)]
pub struct PredictorRegistry {
  project: Vec<Arc<dyn ProjectPredictor>>,
  graph: Vec<Arc<dyn GraphPredictor>>,
}

impl PredictorRegistry {
  /// Catalog minus the output-directory predictor and anything disabled in config.
  ///
  /// Config validation has already rejected unknown names.
  pub fn for_inputs(config: &PredictionConfig) -> Self {
    let project: Vec<_> = catalog::project_predictors()
      .into_iter()
      .filter(|p| p.name() != OUTPUT_DIRECTORY_PREDICTOR)
      .filter(|p| !config.disabled.iter().any(|name| name == p.name()))
      .collect();

    tracing::debug!(
      "Input predictors: {}",
      project.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );

    Self {
      project,
      graph: vec![Arc::new(ProjectFileAndImportsGraphPredictor)],
    }
  }

  /// Registry with an explicit predictor set
  pub fn new(project: Vec<Arc<dyn ProjectPredictor>>, graph: Vec<Arc<dyn GraphPredictor>>) -> Self {
    Self { project, graph }
  }

  pub fn project_predictors(&self) -> &[Arc<dyn ProjectPredictor>] {
    &self.project
  }

  pub fn graph_predictors(&self) -> &[Arc<dyn GraphPredictor>] {
    &self.graph
  }

  /// Names of all registered predictors, project predictors first
  pub fn names(&self) -> Vec<&'static str> {
    self
      .project
      .iter()
      .map(|p| p.name())
      .chain(self.graph.iter().map(|p| p.name()))
      .collect()
  }
}
