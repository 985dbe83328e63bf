use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One evaluated item (e.g. a `Compile` or `ProjectReference` entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItem {
  pub item_type: String,
  /// The evaluated include spec as written after property expansion
  pub include: String,
  /// Absolute path the include resolves to
  pub full_path: PathBuf,
}

/// Result of evaluating a project file together with everything it imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedProject {
  pub path: PathBuf,
  pub directory: PathBuf,
  pub sdk_style: bool,
  /// Keys are lower-cased, MSBuild property names are case-insensitive
  properties: HashMap<String, String>,
  pub items: Vec<ProjectItem>,
  /// Imported files in import order (implicit imports included)
  pub imports: Vec<PathBuf>,
}

impl EvaluatedProject {
  /// Empty model for an absolute project path
  pub fn new(path: PathBuf, sdk_style: bool) -> Self {
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Self {
      path,
      directory,
      sdk_style,
      properties: HashMap::new(),
      items: Vec::new(),
      imports: Vec::new(),
    }
  }

  /// Property value; unset and empty are the same thing in MSBuild
  pub fn property(&self, name: &str) -> Option<&str> {
    self
      .properties
      .get(&name.to_ascii_lowercase())
      .map(String::as_str)
      .filter(|value| !value.is_empty())
  }

  pub fn set_property(&mut self, name: &str, value: impl Into<String>) {
    self.properties.insert(name.to_ascii_lowercase(), value.into());
  }

  /// Property compared to `false`, the usual MSBuild opt-out check
  pub fn is_disabled(&self, name: &str) -> bool {
    self.property(name).is_some_and(|value| value.eq_ignore_ascii_case("false"))
  }

  pub fn add_item(&mut self, item_type: &str, include: &str, full_path: PathBuf) {
    self.items.push(ProjectItem {
      item_type: item_type.to_string(),
      include: include.to_string(),
      full_path,
    });
  }

  pub fn add_import(&mut self, path: PathBuf) {
    self.imports.push(path);
  }

  /// Items of one type, in evaluation order
  pub fn items_of<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a ProjectItem> + 'a {
    self
      .items
      .iter()
      .filter(move |item| item.item_type.eq_ignore_ascii_case(item_type))
  }

  /// Project name as MSBuild reports it (file name without extension)
  pub fn name(&self) -> String {
    self
      .path
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}
