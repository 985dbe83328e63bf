//! Built-in predictors
//!
//! The catalog is a fixed list. [`PREDICTOR_NAMES`] is what configuration is
//! validated against; [`project_predictors`] returns every project predictor,
//! including the output-only one the registry filters out.

use super::predictor::{GraphPredictor, Predictions, ProjectPredictor};
use crate::core::error::AffectedResult;
use crate::graph::ProjectGraph;
use crate::model::EvaluatedProject;
use petgraph::graph::NodeIndex;
use std::sync::Arc;

pub const COMPILE_ITEMS_PREDICTOR: &str = "CompileItemsPredictor";
pub const CONTENT_ITEMS_PREDICTOR: &str = "ContentItemsPredictor";
pub const NONE_ITEMS_PREDICTOR: &str = "NoneItemsPredictor";
pub const EMBEDDED_RESOURCE_ITEMS_PREDICTOR: &str = "EmbeddedResourceItemsPredictor";
pub const ADDITIONAL_FILES_ITEMS_PREDICTOR: &str = "AdditionalFilesItemsPredictor";
pub const PROJECT_FILE_AND_IMPORTS_PREDICTOR: &str = "ProjectFileAndImportsPredictor";
pub const OUTPUT_DIRECTORY_PREDICTOR: &str = "OutputDirectoryPredictor";

/// Every project predictor name, in catalog order
pub const PREDICTOR_NAMES: &[&str] = &[
  COMPILE_ITEMS_PREDICTOR,
  CONTENT_ITEMS_PREDICTOR,
  NONE_ITEMS_PREDICTOR,
  EMBEDDED_RESOURCE_ITEMS_PREDICTOR,
  ADDITIONAL_FILES_ITEMS_PREDICTOR,
  PROJECT_FILE_AND_IMPORTS_PREDICTOR,
  OUTPUT_DIRECTORY_PREDICTOR,
];

/// Properties naming build output locations
const OUTPUT_PROPERTIES: &[&str] = &["OutputPath", "OutDir", "IntermediateOutputPath", "BaseIntermediateOutputPath"];

/// The full project predictor catalog
pub fn project_predictors() -> Vec<Arc<dyn ProjectPredictor>> {
  vec![
    Arc::new(ItemTypePredictor::new(COMPILE_ITEMS_PREDICTOR, "Compile")),
    Arc::new(ItemTypePredictor::new(CONTENT_ITEMS_PREDICTOR, "Content")),
    Arc::new(ItemTypePredictor::new(NONE_ITEMS_PREDICTOR, "None")),
    Arc::new(ItemTypePredictor::new(EMBEDDED_RESOURCE_ITEMS_PREDICTOR, "EmbeddedResource")),
    Arc::new(ItemTypePredictor::new(ADDITIONAL_FILES_ITEMS_PREDICTOR, "AdditionalFiles")),
    Arc::new(ProjectFileAndImportsPredictor),
    Arc::new(OutputDirectoryPredictor),
  ]
}

/// Every item of one type is an input file.
#[derive(Debug, Clone)]
pub struct ItemTypePredictor {
  name: &'static str,
  item_type: &'static str,
}

impl ItemTypePredictor {
  pub fn new(name: &'static str, item_type: &'static str) -> Self {
    Self { name, item_type }
  }
}

impl ProjectPredictor for ItemTypePredictor {
  fn name(&self) -> &'static str {
    self.name
  }

  fn predict(&self, project: &EvaluatedProject, predictions: &mut Predictions) -> AffectedResult<()> {
    for item in project.items_of(self.item_type) {
      predictions.add_input_file(item.full_path.clone());
    }
    Ok(())
  }
}

/// The project file itself plus every file it imports.
#[derive(Debug, Clone, Copy)]
pub struct ProjectFileAndImportsPredictor;

impl ProjectPredictor for ProjectFileAndImportsPredictor {
  fn name(&self) -> &'static str {
    PROJECT_FILE_AND_IMPORTS_PREDICTOR
  }

  fn predict(&self, project: &EvaluatedProject, predictions: &mut Predictions) -> AffectedResult<()> {
    predictions.add_input_file(project.path.clone());
    for import in &project.imports {
      predictions.add_input_file(import.clone());
    }
    Ok(())
  }
}

/// Output and intermediate directories. Never an input.
#[derive(Debug, Clone, Copy)]
pub struct OutputDirectoryPredictor;

impl ProjectPredictor for OutputDirectoryPredictor {
  fn name(&self) -> &'static str {
    OUTPUT_DIRECTORY_PREDICTOR
  }

  fn predict(&self, project: &EvaluatedProject, predictions: &mut Predictions) -> AffectedResult<()> {
    for property in OUTPUT_PROPERTIES {
      if let Some(value) = project.property(property) {
        predictions.add_output_directory(project.directory.join(crate::paths::normalize_separators(value)));
      }
    }
    Ok(())
  }
}

/// Project files and imports of every project the node transitively references.
///
/// A change to a referenced project's build logic can change what this
/// project compiles against.
#[derive(Debug, Clone, Copy)]
pub struct ProjectFileAndImportsGraphPredictor;

impl GraphPredictor for ProjectFileAndImportsGraphPredictor {
  fn name(&self) -> &'static str {
    "ProjectFileAndImportsGraphPredictor"
  }

  fn predict(&self, graph: &ProjectGraph, node: NodeIndex, predictions: &mut Predictions) -> AffectedResult<()> {
    for dependency in graph.transitive_references(node) {
      ProjectFileAndImportsPredictor.predict(&graph.node(dependency).model, predictions)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use std::path::{Path, PathBuf};

  fn sample() -> EvaluatedProject {
    let mut project = EvaluatedProject::new(PathBuf::from("/repo/app/app.csproj"), true);
    project.add_item("Compile", "Program.cs", PathBuf::from("/repo/app/Program.cs"));
    project.add_item("Content", "appsettings.json", PathBuf::from("/repo/app/appsettings.json"));
    project.add_item("None", "README.md", PathBuf::from("/repo/app/README.md"));
    project.add_item("PackageReference", "Serilog", PathBuf::from("/repo/app/Serilog"));
    project.add_import(PathBuf::from("/repo/Directory.Build.props"));
    project.set_property("OutputPath", "bin/Release/");
    project
  }

  #[test]
  fn test_catalog_names_match_predictors() {
    let names: Vec<_> = project_predictors().iter().map(|p| p.name()).collect();
    assert_eq!(names, PREDICTOR_NAMES);
    let distinct: HashSet<_> = names.iter().collect();
    assert_eq!(distinct.len(), names.len());
  }

  #[test]
  fn test_item_type_predictor() {
    let mut predictions = Predictions::default();
    ItemTypePredictor::new(COMPILE_ITEMS_PREDICTOR, "compile")
      .predict(&sample(), &mut predictions)
      .unwrap();
    assert_eq!(predictions.input_files, vec![PathBuf::from("/repo/app/Program.cs")]);
  }

  #[test]
  fn test_project_file_and_imports() {
    let mut predictions = Predictions::default();
    ProjectFileAndImportsPredictor.predict(&sample(), &mut predictions).unwrap();
    assert_eq!(
      predictions.input_files,
      vec![PathBuf::from("/repo/app/app.csproj"), PathBuf::from("/repo/Directory.Build.props")]
    );
  }

  #[test]
  fn test_output_directory_predicts_no_inputs() {
    let mut predictions = Predictions::default();
    OutputDirectoryPredictor.predict(&sample(), &mut predictions).unwrap();
    assert!(predictions.input_files.is_empty());
    assert_eq!(predictions.output_directories.len(), 1);
    assert!(predictions.output_directories[0].starts_with(Path::new("/repo/app")));
  }
}
