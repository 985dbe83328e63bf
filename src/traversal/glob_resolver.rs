//! Glob-based traversal membership
//!
//! Expands wildcard `ProjectReference` includes of a traversal project into the
//! matching project files on disk. `Remove` attributes become path prefixes that
//! filter the expansion. Both passes honor the "not on Windows" group gate.

use crate::core::error::AffectedResult;
use crate::model::{RawItemGroup, RawProject};
use crate::paths::{PathComparer, has_wildcard, normalize_separators, starts_with_ignore_case, walk_files};
use crate::platform::HostPlatform;
use std::collections::BTreeMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

const MEMBER_ITEM: &str = "ProjectReference";

/// Where and how to search for one wildcard include
#[derive(Debug, Clone, PartialEq, Eq)]
struct GlobSearch {
  /// Directory relative to the traversal project; empty means the project dir
  base: String,
  /// File-name pattern
  pattern: String,
  recursive: bool,
}

/// Expands wildcard member includes of a traversal project.
#[derive(Debug, Clone)]
pub struct GlobMemberResolver {
  comparer: PathComparer,
  host: HostPlatform,
  default_search_pattern: String,
}

impl GlobMemberResolver {
  /// `default_search_pattern` applies when an include ends in `**` (e.g. `src/**`)
  pub fn new(comparer: PathComparer, host: HostPlatform, default_search_pattern: impl Into<String>) -> Self {
    Self {
      comparer,
      host,
      default_search_pattern: default_search_pattern.into(),
    }
  }

  /// Member project paths, deduplicated and sorted case-insensitively.
  ///
  /// A missing glob base contributes nothing; enumeration errors propagate.
  pub fn resolve(&self, aggregator: &RawProject) -> AffectedResult<Vec<PathBuf>> {
    let aggregator_dir = aggregator.directory();
    let groups: Vec<&RawItemGroup> = aggregator
      .item_groups()
      .filter(|group| self.host.applies(group.condition.as_deref()))
      .collect();

    let prefixes = exclusion_prefixes(&groups);
    let mut members: BTreeMap<String, PathBuf> = BTreeMap::new();

    for group in &groups {
      for item in group.items.iter().filter(|i| i.item_type.eq_ignore_ascii_case(MEMBER_ITEM)) {
        for include in item.include.split(';').map(str::trim).filter(|s| has_wildcard(s)) {
          let search = self.plan_search(include);
          let base_dir = self.comparer.canonicalize_in(aggregator_dir, Path::new(&search.base));
          if !base_dir.is_dir() {
            tracing::debug!("Glob base {} does not exist, skipping '{}'", base_dir.display(), include);
            continue;
          }

          for path in self.enumerate(&base_dir, &search)? {
            if is_excluded(&path, &[base_dir.as_path(), aggregator_dir], &prefixes) {
              tracing::debug!("Excluded {} from '{}'", path.display(), include);
              continue;
            }
            members.entry(path.to_string_lossy().to_lowercase()).or_insert(path);
          }
        }
      }
    }

    Ok(members.into_values().collect())
  }

  fn plan_search(&self, include: &str) -> GlobSearch {
    let include = normalize_separators(include);

    match include.find("**") {
      Some(idx) => {
        let base = include[..idx].trim_end_matches(MAIN_SEPARATOR);
        let remainder = include[idx + 2..].trim_start_matches(MAIN_SEPARATOR);
        let pattern = if has_wildcard(remainder) {
          last_segment(remainder).to_string()
        } else {
          self.default_search_pattern.clone()
        };
        GlobSearch {
          base: literal_base(base),
          pattern,
          recursive: true,
        }
      }
      None => {
        let (base, pattern) = include.rsplit_once(MAIN_SEPARATOR).unwrap_or(("", include.as_str()));
        GlobSearch {
          base: literal_base(base),
          pattern: pattern.to_string(),
          recursive: false,
        }
      }
    }
  }

  fn enumerate(&self, base_dir: &Path, search: &GlobSearch) -> AffectedResult<Vec<PathBuf>> {
    let pattern = glob::Pattern::new(&search.pattern)?;
    let options = glob::MatchOptions {
      case_sensitive: self.comparer.is_case_sensitive(),
      require_literal_separator: true,
      require_literal_leading_dot: false,
    };
    let max_depth = if search.recursive { usize::MAX } else { 1 };

    let files = walk_files(base_dir, max_depth, |path| {
      path
        .file_name()
        .is_some_and(|name| pattern.matches_with(&name.to_string_lossy(), options))
    })?;
    Ok(files.iter().map(|path| self.comparer.canonicalize(path)).collect())
  }
}

/// Distinct `Remove` prefixes of the active groups, each ending in one separator
fn exclusion_prefixes(groups: &[&RawItemGroup]) -> Vec<String> {
  let mut prefixes: Vec<String> = Vec::new();

  let removes = groups
    .iter()
    .flat_map(|group| group.items.iter())
    .filter(|item| item.item_type.eq_ignore_ascii_case(MEMBER_ITEM))
    .filter_map(|item| item.remove.as_deref());

  for remove in removes.flat_map(|r| r.split(';')).map(str::trim).filter(|r| !r.is_empty()) {
    let remove = normalize_separators(remove);
    let stem = match remove.find("**") {
      Some(idx) => &remove[..idx],
      None => remove.as_str(),
    };
    let stem = stem.trim_end_matches(MAIN_SEPARATOR);
    if stem.is_empty() {
      continue;
    }

    let prefix = format!("{}{}", stem, MAIN_SEPARATOR);
    if !prefixes.iter().any(|p| p.eq_ignore_ascii_case(&prefix)) {
      prefixes.push(prefix);
    }
  }

  prefixes
}

/// True when `path`, relative to any of `bases`, starts with an exclusion prefix
fn is_excluded(path: &Path, bases: &[&Path], prefixes: &[String]) -> bool {
  if prefixes.is_empty() {
    return false;
  }
  bases.iter().any(|base| {
    let Some(relative) = pathdiff::diff_paths(path, base) else {
      return false;
    };
    let relative = normalize_separators(&relative.to_string_lossy());
    prefixes.iter().any(|prefix| starts_with_ignore_case(&relative, prefix))
  })
}

/// A base that itself contains wildcards cannot be enumerated literally
fn literal_base(base: &str) -> String {
  if has_wildcard(base) { String::new() } else { base.to_string() }
}

fn last_segment(path: &str) -> &str {
  path.rsplit(MAIN_SEPARATOR).next().unwrap_or(path)
}
