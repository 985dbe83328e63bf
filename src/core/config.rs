use crate::core::error::{AffectedResult, ConfigError, ResultExt};
use crate::prediction::catalog::{OUTPUT_DIRECTORY_PREDICTOR, PREDICTOR_NAMES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for msbuild-affected
/// Searched in order: affected.toml, .affected.toml, .config/affected.toml
///
/// Every section is optional; a repository without a config file gets the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectedConfig {
  #[serde(default)]
  pub affected: ChangeConfig,
  #[serde(default)]
  pub traversal: TraversalConfig,
  #[serde(default)]
  pub prediction: PredictionConfig,
}

/// How changed files are filtered before matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeConfig {
  /// File name suffixes that never trigger prediction or direct matches.
  /// Central package version pins are handled by a separate mechanism.
  #[serde(default = "default_excluded_suffixes")]
  pub excluded_suffixes: Vec<String>,
}

fn default_excluded_suffixes() -> Vec<String> {
  vec!["Directory.Packages.props".to_string()]
}

impl Default for ChangeConfig {
  fn default() -> Self {
    Self {
      excluded_suffixes: default_excluded_suffixes(),
    }
  }
}

/// Traversal (aggregator) project conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalConfig {
  /// File extension an aggregator must carry (without the dot)
  #[serde(default = "default_traversal_extension")]
  pub extension: String,

  /// File name pattern used when a `**` member glob names no file pattern
  #[serde(default = "default_search_pattern")]
  pub default_search_pattern: String,
}

fn default_traversal_extension() -> String {
  "proj".to_string()
}

fn default_search_pattern() -> String {
  "*.csproj".to_string()
}

impl Default for TraversalConfig {
  fn default() -> Self {
    Self {
      extension: default_traversal_extension(),
      default_search_pattern: default_search_pattern(),
    }
  }
}

/// Predictor selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
  /// Predictors to skip in addition to the output-directory predictor
  #[serde(default)]
  pub disabled: Vec<String>,
}

impl AffectedConfig {
  /// Find config file in search order: affected.toml, .affected.toml, .config/affected.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("affected.toml"),
      path.join(".affected.toml"),
      path.join(".config").join("affected.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the first candidate file, or defaults when none exists
  pub fn load(path: &Path) -> AffectedResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!("No affected.toml under {}, using defaults", path.display());
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content, &config_path)?;
    tracing::debug!("Loaded config from {}", config_path.display());
    Ok(config)
  }

  /// Parse and validate config text; `origin` is only used in error messages
  pub fn parse(content: &str, origin: &Path) -> AffectedResult<Self> {
    let config: AffectedConfig = toml_edit::de::from_str(content).map_err(|e| ConfigError::Parse {
      path: origin.to_path_buf(),
      message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values
  pub fn validate(&self) -> AffectedResult<()> {
    let extension = self.traversal.extension.trim_start_matches('.');
    if extension.is_empty() {
      return Err(invalid("traversal.extension", "must not be empty"));
    }

    if self.traversal.default_search_pattern.contains(['/', '\\']) {
      return Err(invalid(
        "traversal.default_search_pattern",
        "must be a file name pattern without separators",
      ));
    }
    if let Err(e) = glob::Pattern::new(&self.traversal.default_search_pattern) {
      return Err(invalid("traversal.default_search_pattern", &e.to_string()));
    }

    if self.affected.excluded_suffixes.iter().any(|s| s.is_empty()) {
      return Err(invalid("affected.excluded_suffixes", "entries must not be empty"));
    }

    for name in &self.prediction.disabled {
      if !PREDICTOR_NAMES.contains(&name.as_str()) {
        return Err(invalid("prediction.disabled", &format!("unknown predictor '{}'", name)));
      }
      if name == OUTPUT_DIRECTORY_PREDICTOR {
        tracing::debug!("{} is always disabled, listing it is redundant", name);
      }
    }

    Ok(())
  }

  /// Aggregator extension without a leading dot
  pub fn traversal_extension(&self) -> &str {
    self.traversal.extension.trim_start_matches('.')
  }
}

fn invalid(field: &str, reason: &str) -> crate::core::error::AffectedError {
  ConfigError::Invalid {
    field: field.to_string(),
    reason: reason.to_string(),
  }
  .into()
}
