//! Path identity: canonical form, equality and hashing
//!
//! Everything that compares or stores a path goes through a [`PathComparer`].
//! Canonicalization is purely lexical (`.`/`..` folded, separators unified);
//! the filesystem is never consulted, so symlinks are not resolved and
//! malformed paths pass through untouched until something tries to open them.

use crate::core::error::AffectedResult;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Canonical, comparison-ready form of a path.
///
/// Two paths that the host filesystem treats as the same file produce equal
/// keys. On case-insensitive hosts the key is lower-cased, so keys are for
/// lookups only; keep the original `PathBuf` for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for PathKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Canonicalizes and compares paths with host-appropriate case sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathComparer {
  case_sensitive: bool,
}

impl PathComparer {
  /// Comparer for the current host, detected once per process.
  pub fn host() -> Self {
    static HOST_CASE_SENSITIVE: OnceLock<bool> = OnceLock::new();
    let case_sensitive = *HOST_CASE_SENSITIVE.get_or_init(|| !cfg!(any(target_os = "windows", target_os = "macos")));
    Self { case_sensitive }
  }

  pub fn case_sensitive() -> Self {
    Self { case_sensitive: true }
  }

  pub fn case_insensitive() -> Self {
    Self { case_sensitive: false }
  }

  pub fn is_case_sensitive(&self) -> bool {
    self.case_sensitive
  }

  /// Absolute, lexically normalized form of `path`.
  ///
  /// Relative paths are resolved against the process working directory.
  pub fn canonicalize(&self, path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_lexically(&absolute)
  }

  /// Like [`canonicalize`](Self::canonicalize) but resolves relative paths against `base`.
  pub fn canonicalize_in(&self, base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
      self.canonicalize(path)
    } else {
      self.canonicalize(&base.join(path))
    }
  }

  /// Comparison key for `path`.
  pub fn key(&self, path: &Path) -> PathKey {
    self.key_of_canonical(&self.canonicalize(path))
  }

  /// Comparison key for a path that is already canonical.
  pub fn key_of_canonical(&self, canonical: &Path) -> PathKey {
    let text = canonical.to_string_lossy();
    if self.case_sensitive {
      PathKey(text.into_owned())
    } else {
      PathKey(text.to_lowercase())
    }
  }

  pub fn eq(&self, a: &Path, b: &Path) -> bool {
    self.key(a) == self.key(b)
  }

  pub fn hash_of(&self, path: &Path) -> u64 {
    let mut hasher = DefaultHasher::new();
    self.key(path).hash(&mut hasher);
    hasher.finish()
  }
}

/// Convert both `/` and `\` to the platform separator.
pub fn normalize_separators(path: &str) -> String {
  path
    .chars()
    .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
    .collect()
}

/// True when `text` contains a glob wildcard (`*` or `?`).
pub fn has_wildcard(text: &str) -> bool {
  text.contains(['*', '?'])
}

/// ASCII case-insensitive `ends_with`.
pub fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
  text.len() >= suffix.len()
    && text.is_char_boundary(text.len() - suffix.len())
    && text[text.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// ASCII case-insensitive `starts_with`.
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
  text.len() >= prefix.len() && text.is_char_boundary(prefix.len()) && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// True when the file name follows the MSBuild project convention (`*.csproj`, `dirs.proj`, ...).
pub fn is_project_file(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ends_with_ignore_case(ext, "proj"))
}

/// Files under `root` (at most `max_depth` levels down) accepted by `keep`.
///
/// Linked directories are never entered, so a link back up the tree cannot
/// loop. A link to a regular file counts as a file.
pub fn walk_files(root: &Path, max_depth: usize, mut keep: impl FnMut(&Path) -> bool) -> AffectedResult<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in WalkDir::new(root).follow_links(false).min_depth(1).max_depth(max_depth) {
    let entry = entry?;
    let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file());
    if is_file && keep(entry.path()) {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

fn normalize_lexically(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        // Never pop past the root
        if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
          normalized.pop();
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_canonicalize_folds_dot_segments() {
    let comparer = PathComparer::case_sensitive();
    let base = std::env::temp_dir();
    let canonical = comparer.canonicalize_in(&base, Path::new("a/./b/../c.csproj"));
    assert_eq!(canonical, comparer.canonicalize(&base.join("a").join("c.csproj")));
    assert!(canonical.is_absolute());
  }

  #[test]
  fn test_parent_dir_does_not_escape_root() {
    let comparer = PathComparer::case_sensitive();
    let root = comparer.canonicalize(Path::new("/"));
    let canonical = comparer.canonicalize(&root.join("..").join("..").join("x"));
    assert_eq!(canonical, root.join("x"));
  }

  #[test]
  fn test_case_insensitive_equality_and_hash() {
    let comparer = PathComparer::case_insensitive();
    let a = std::env::temp_dir().join("Src").join("App.csproj");
    let b = std::env::temp_dir().join("src").join("app.CSPROJ");
    assert!(comparer.eq(&a, &b));
    assert_eq!(comparer.hash_of(&a), comparer.hash_of(&b));
  }

  #[test]
  fn test_case_sensitive_inequality() {
    let comparer = PathComparer::case_sensitive();
    let a = std::env::temp_dir().join("Src").join("App.csproj");
    let b = std::env::temp_dir().join("src").join("app.csproj");
    assert!(!comparer.eq(&a, &b));
  }

  #[test]
  fn test_host_detection_is_stable() {
    assert_eq!(PathComparer::host(), PathComparer::host());
    #[cfg(target_os = "linux")]
    assert!(PathComparer::host().is_case_sensitive());
    #[cfg(target_os = "windows")]
    assert!(!PathComparer::host().is_case_sensitive());
  }

  #[test]
  fn test_normalize_separators() {
    let expected = format!("src{0}legacy{0}**", MAIN_SEPARATOR);
    assert_eq!(normalize_separators("src/legacy\\**"), expected);
  }

  #[test]
  fn test_project_file_convention() {
    assert!(is_project_file(Path::new("a/a.csproj")));
    assert!(is_project_file(Path::new("dirs.proj")));
    assert!(is_project_file(Path::new("B.VBPROJ")));
    assert!(!is_project_file(Path::new("Directory.Build.props")));
    assert!(!is_project_file(Path::new("Program.cs")));
  }

  #[test]
  fn test_affix_helpers() {
    assert!(ends_with_ignore_case("/repo/directory.packages.props", "Directory.Packages.props"));
    assert!(!ends_with_ignore_case("props", "Directory.Packages.props"));
    assert!(starts_with_ignore_case("Legacy/y/y.csproj", "legacy/"));
    assert!(!starts_with_ignore_case("src/x.csproj", "legacy/"));
  }

  #[test]
  fn test_walk_files_respects_depth() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    std::fs::write(dir.path().join("top.cs"), "").unwrap();
    std::fs::write(dir.path().join("a/b/deep.cs"), "").unwrap();

    let shallow = walk_files(dir.path(), 1, |_| true).unwrap();
    assert_eq!(shallow, vec![dir.path().join("top.cs")]);

    let mut all = walk_files(dir.path(), usize::MAX, |_| true).unwrap();
    all.sort();
    assert_eq!(all, vec![dir.path().join("a/b/deep.cs"), dir.path().join("top.cs")]);
  }

  #[cfg(unix)]
  #[test]
  fn test_walk_files_does_not_enter_linked_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src/a")).unwrap();
    std::fs::write(dir.path().join("src/a/a.cs"), "").unwrap();
    std::os::unix::fs::symlink(dir.path().join("src"), dir.path().join("src/a/loop")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("src/a/a.cs"), dir.path().join("src/alias.cs")).unwrap();

    let mut files = walk_files(&dir.path().join("src"), usize::MAX, |_| true).unwrap();
    files.sort();
    assert_eq!(
      files,
      vec![dir.path().join("src/a/a.cs"), dir.path().join("src/alias.cs")]
    );
  }
}
