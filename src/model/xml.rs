//! Default project model provider backed by the project XML on disk
//!
//! Evaluation follows MSBuild's pass order closely enough for input
//! prediction: properties and imports first (document order, imports inlined),
//! then items against the final property values. SDK-style projects also get
//! the implicit `Directory.*` imports and default item globs.

use super::condition;
use super::evaluated::EvaluatedProject;
use super::raw::{RawElement, RawItem, RawItemGroup, RawProject};
use super::ProjectModelProvider;
use crate::core::error::{AffectedResult, ModelError, ResultExt};
use crate::paths::{PathComparer, PathKey, has_wildcard, normalize_separators, starts_with_ignore_case, walk_files};
use crate::platform::HostPlatform;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use std::sync::LazyLock;

static PROPERTY_REF: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\$\(\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\)").expect("property reference regex"));

/// Reads and evaluates project files from disk.
#[derive(Debug, Clone, Copy)]
pub struct XmlProjectProvider {
  comparer: PathComparer,
  host: HostPlatform,
}

impl XmlProjectProvider {
  pub fn new(comparer: PathComparer, host: HostPlatform) -> Self {
    Self { comparer, host }
  }
}

impl ProjectModelProvider for XmlProjectProvider {
  fn open_raw(&self, path: &Path) -> AffectedResult<RawProject> {
    let path = self.comparer.canonicalize(path);
    let text = match fs::read_to_string(&path) {
      Ok(text) => text,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ModelError::ProjectNotFound { path }.into());
      }
      Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    RawProject::parse(&path, &text)
  }

  fn evaluate(&self, path: &Path) -> AffectedResult<EvaluatedProject> {
    let raw = self.open_raw(path)?;
    tracing::debug!("Evaluating {}", raw.path.display());
    Evaluation::new(self, &raw).run(&raw)
  }
}

/// Item group waiting for the item pass, with the file that declared it
struct PendingItemGroup {
  file: PathBuf,
  group: RawItemGroup,
}

struct Evaluation<'p> {
  provider: &'p XmlProjectProvider,
  project: EvaluatedProject,
  imported: HashSet<PathKey>,
  item_groups: Vec<PendingItemGroup>,
}

impl<'p> Evaluation<'p> {
  fn new(provider: &'p XmlProjectProvider, raw: &RawProject) -> Self {
    let mut project = EvaluatedProject::new(raw.path.clone(), raw.is_sdk_style());
    let path = &raw.path;

    project.set_property("OS", provider.host.os_property());
    project.set_property("MSBuildProjectFullPath", path.to_string_lossy());
    project.set_property("MSBuildProjectDirectory", raw.directory().to_string_lossy());
    project.set_property("MSBuildProjectName", project.name());
    project.set_property("MSBuildProjectFile", file_name(path));
    project.set_property(
      "MSBuildProjectExtension",
      path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default(),
    );

    let mut imported = HashSet::new();
    imported.insert(provider.comparer.key(path));

    Self {
      provider,
      project,
      imported,
      item_groups: Vec::new(),
    }
  }

  fn run(mut self, raw: &RawProject) -> AffectedResult<EvaluatedProject> {
    let sdk_style = raw.is_sdk_style();

    // Pass 1: properties and imports
    if sdk_style {
      self.import_implicit("Directory.Build.props", "ImportDirectoryBuildProps")?;
      self.import_implicit("Directory.Packages.props", "ImportDirectoryPackagesProps")?;
    }
    self.walk(raw)?;
    if sdk_style {
      self.import_implicit("Directory.Build.targets", "ImportDirectoryBuildTargets")?;
    }

    // Pass 2: items; only the .NET SDKs define default item globs
    let dotnet_sdk = raw
      .sdk
      .as_deref()
      .is_some_and(|sdk| starts_with_ignore_case(sdk, "Microsoft.NET.Sdk"));
    if dotnet_sdk {
      self.add_default_items()?;
    }
    for pending in std::mem::take(&mut self.item_groups) {
      self.evaluate_item_group(&pending)?;
    }

    Ok(self.project)
  }

  fn walk(&mut self, raw: &RawProject) -> AffectedResult<()> {
    self.enter_file(&raw.path);
    let dir = raw.directory().to_path_buf();

    for element in &raw.elements {
      match element {
        RawElement::PropertyGroup(group) => {
          if !self.condition_holds(group.condition.as_deref(), &dir) {
            continue;
          }
          for property in &group.properties {
            if self.condition_holds(property.condition.as_deref(), &dir) {
              let value = self.expand(&property.value);
              self.project.set_property(&property.name, value);
            }
          }
        }
        RawElement::ItemGroup(group) => self.item_groups.push(PendingItemGroup {
          file: raw.path.clone(),
          group: group.clone(),
        }),
        RawElement::Import(import) => {
          if self.condition_holds(import.condition.as_deref(), &dir) {
            let spec = self.expand(&import.project);
            self.import(&raw.path, &spec)?;
            // The import switched the MSBuildThisFile* properties
            self.enter_file(&raw.path);
          }
        }
      }
    }

    Ok(())
  }

  fn import(&mut self, importing_file: &Path, spec: &str) -> AffectedResult<()> {
    let dir = importing_file.parent().unwrap_or(Path::new(""));

    for part in split_list(spec) {
      let candidates = if has_wildcard(part) {
        self.glob_files(dir, part)?
      } else {
        vec![self.provider.comparer.canonicalize_in(dir, Path::new(&normalize_separators(part)))]
      };

      for path in candidates {
        if !path.is_file() {
          tracing::warn!("Skipping missing import {} in {}", path.display(), importing_file.display());
          continue;
        }
        self.import_file(&path)?;
      }
    }

    Ok(())
  }

  fn import_file(&mut self, path: &Path) -> AffectedResult<()> {
    if !self.imported.insert(self.provider.comparer.key(path)) {
      tracing::debug!("{} already imported, skipping", path.display());
      return Ok(());
    }

    let raw = self.provider.open_raw(path)?;
    self.project.add_import(raw.path.clone());
    self.walk(&raw)
  }

  /// Nearest ancestor file named `file_name`, unless `$(opt_out)` is `false`
  fn import_implicit(&mut self, file_name: &str, opt_out: &str) -> AffectedResult<()> {
    if self.project.is_disabled(opt_out) {
      return Ok(());
    }
    let found = self
      .project
      .directory
      .ancestors()
      .map(|dir| dir.join(file_name))
      .find(|candidate| candidate.is_file());

    match found {
      Some(path) => {
        self.import_file(&path)?;
        let project_path = self.project.path.clone();
        self.enter_file(&project_path);
        Ok(())
      }
      None => Ok(()),
    }
  }

  fn add_default_items(&mut self) -> AffectedResult<()> {
    if self.project.is_disabled("EnableDefaultItems") {
      return Ok(());
    }

    let language_glob = match self.project.property("MSBuildProjectExtension") {
      Some(ext) if ext.eq_ignore_ascii_case(".csproj") => Some("**/*.cs"),
      Some(ext) if ext.eq_ignore_ascii_case(".vbproj") => Some("**/*.vb"),
      _ => None,
    };

    let mut defaults = Vec::new();
    if let Some(pattern) = language_glob
      && !self.project.is_disabled("EnableDefaultCompileItems")
    {
      defaults.push(("Compile", pattern));
    }
    if !self.project.is_disabled("EnableDefaultEmbeddedResourceItems") {
      defaults.push(("EmbeddedResource", "**/*.resx"));
    }

    let excluded_roots = [("BaseOutputPath", "bin"), ("BaseIntermediateOutputPath", "obj")]
      .map(|(name, default)| first_segment(self.project.property(name).unwrap_or(default)).to_string());
    let project_dir = self.project.directory.clone();

    for (item_type, pattern) in defaults {
      for path in self.glob_files(&project_dir, pattern)? {
        let in_output = path
          .strip_prefix(&project_dir)
          .ok()
          .and_then(|relative| relative.components().next())
          .is_some_and(|first| match first {
            Component::Normal(name) => excluded_roots
              .iter()
              .any(|root| name.to_string_lossy().eq_ignore_ascii_case(root)),
            _ => false,
          });
        if !in_output {
          let include = relative_include(&project_dir, &path);
          self.project.add_item(item_type, &include, path);
        }
      }
    }

    Ok(())
  }

  fn evaluate_item_group(&mut self, pending: &PendingItemGroup) -> AffectedResult<()> {
    self.enter_file(&pending.file);
    let dir = pending.file.parent().unwrap_or(Path::new("")).to_path_buf();

    if !self.condition_holds(pending.group.condition.as_deref(), &dir) {
      return Ok(());
    }

    for item in &pending.group.items {
      if self.condition_holds(item.condition.as_deref(), &dir) {
        self.evaluate_item(item)?;
      }
    }

    Ok(())
  }

  fn evaluate_item(&mut self, item: &RawItem) -> AffectedResult<()> {
    // Relative item specs resolve against the project, not the declaring import
    let project_dir = self.project.directory.clone();

    if !item.include.is_empty() {
      let include = self.expand(&item.include);
      let excludes = item.exclude.as_deref().map(|e| self.expand(e)).unwrap_or_default();
      let excludes = self.matchers(&project_dir, &excludes)?;

      for spec in split_list(&include) {
        let paths = if has_wildcard(spec) {
          self.glob_files(&project_dir, spec)?
        } else {
          vec![self.provider.comparer.canonicalize_in(&project_dir, Path::new(&normalize_separators(spec)))]
        };
        for path in paths {
          if excludes.iter().any(|m| m.matches(&path)) {
            continue;
          }
          let include_text = if has_wildcard(spec) {
            relative_include(&project_dir, &path)
          } else {
            spec.to_string()
          };
          self.project.add_item(&item.item_type, &include_text, path);
        }
      }
    }

    if let Some(remove) = &item.remove {
      let remove = self.expand(remove);
      let matchers = self.matchers(&project_dir, &remove)?;
      let item_type = item.item_type.clone();
      self.project.items.retain(|existing| {
        !existing.item_type.eq_ignore_ascii_case(&item_type) || !matchers.iter().any(|m| m.matches(&existing.full_path))
      });
    }

    Ok(())
  }

  fn matchers(&self, dir: &Path, list: &str) -> AffectedResult<Vec<PathMatcher>> {
    let comparer = self.provider.comparer;
    split_list(list)
      .map(|spec| -> AffectedResult<PathMatcher> {
        if has_wildcard(spec) {
          let pattern = glob::Pattern::new(&glob_pattern(dir, spec))?;
          Ok(PathMatcher::Pattern(pattern, match_options(comparer)))
        } else {
          let path = comparer.canonicalize_in(dir, Path::new(&normalize_separators(spec)));
          Ok(PathMatcher::Exact(comparer, comparer.key(&path)))
        }
      })
      .collect()
  }

  /// Files matching `spec` under `dir`, sorted for stable item order
  fn glob_files(&self, dir: &Path, spec: &str) -> AffectedResult<Vec<PathBuf>> {
    let comparer = self.provider.comparer;
    let pattern =
      glob::Pattern::new(&glob_pattern(dir, spec)).with_context(|| format!("Invalid item pattern '{}'", spec))?;
    let (root, max_depth) = walk_root(dir, spec);
    if !root.is_dir() {
      return Ok(Vec::new());
    }

    let options = match_options(comparer);
    let mut files: Vec<PathBuf> = walk_files(&root, max_depth, |path| pattern.matches_path_with(path, options))?
      .iter()
      .map(|path| comparer.canonicalize(path))
      .collect();
    files.sort();
    Ok(files)
  }

  fn condition_holds(&self, condition: Option<&str>, dir: &Path) -> bool {
    match condition {
      Some(condition) => condition::evaluate(&self.expand(condition), dir),
      None => true,
    }
  }

  /// Substitute `$(Name)` references; unknown properties expand to nothing
  fn expand(&self, text: &str) -> String {
    if !text.contains("$(") {
      return text.to_string();
    }
    PROPERTY_REF
      .replace_all(text, |caps: &regex::Captures<'_>| {
        self.project.property(&caps[1]).unwrap_or_default().to_string()
      })
      .into_owned()
  }

  /// Point the `MSBuildThisFile*` properties at `file`
  fn enter_file(&mut self, file: &Path) {
    let dir = file.parent().unwrap_or(Path::new(""));
    let mut dir_text = dir.to_string_lossy().into_owned();
    if !dir_text.ends_with(MAIN_SEPARATOR) {
      dir_text.push(MAIN_SEPARATOR);
    }

    self.project.set_property("MSBuildThisFileDirectory", dir_text);
    self.project.set_property("MSBuildThisFileFullPath", file.to_string_lossy());
    self.project.set_property("MSBuildThisFile", file_name(file));
    self.project.set_property(
      "MSBuildThisFileName",
      file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default(),
    );
  }
}

enum PathMatcher {
  Pattern(glob::Pattern, glob::MatchOptions),
  Exact(PathComparer, PathKey),
}

impl PathMatcher {
  fn matches(&self, path: &Path) -> bool {
    match self {
      PathMatcher::Pattern(pattern, options) => pattern.matches_path_with(path, *options),
      PathMatcher::Exact(comparer, key) => comparer.key(path) == *key,
    }
  }
}

fn match_options(comparer: PathComparer) -> glob::MatchOptions {
  glob::MatchOptions {
    case_sensitive: comparer.is_case_sensitive(),
    require_literal_separator: true,
    require_literal_leading_dot: false,
  }
}

/// Absolute glob pattern: escaped directory + spec with `/` separators
fn glob_pattern(dir: &Path, spec: &str) -> String {
  let spec = spec.replace('\\', "/");
  if Path::new(&spec).is_absolute() {
    return spec;
  }
  let dir = glob::Pattern::escape(&dir.to_string_lossy());
  format!("{}/{}", dir.trim_end_matches(['/', '\\']), spec.trim_start_matches("./"))
}

/// Literal directory a wildcard spec starts from, and how deep its wildcards reach
fn walk_root(dir: &Path, spec: &str) -> (PathBuf, usize) {
  let spec = spec.replace('\\', "/");
  let spec = spec.trim_start_matches("./");
  let segments: Vec<&str> = spec.split('/').collect();
  let split = segments.iter().position(|s| has_wildcard(s)).unwrap_or(segments.len());

  let literal = segments[..split].join("/");
  let root = if Path::new(spec).is_absolute() {
    PathBuf::from(literal)
  } else {
    dir.join(literal)
  };

  let rest = &segments[split..];
  let max_depth = if rest.iter().any(|s| s.contains("**")) {
    usize::MAX
  } else {
    rest.iter().filter(|s| !s.is_empty()).count()
  };
  (root, max_depth)
}

/// `;`-separated MSBuild list, blanks dropped
fn split_list(list: &str) -> impl Iterator<Item = &str> {
  list.split(';').map(str::trim).filter(|part| !part.is_empty())
}

fn first_segment(path: &str) -> &str {
  path
    .split(['/', '\\'])
    .find(|segment| !segment.is_empty() && *segment != ".")
    .unwrap_or(path)
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}

fn relative_include(dir: &Path, path: &Path) -> String {
  pathdiff::diff_paths(path, dir)
    .unwrap_or_else(|| path.to_path_buf())
    .to_string_lossy()
    .into_owned()
}
