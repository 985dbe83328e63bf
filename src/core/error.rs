//! Error types for msbuild-affected with contextual messages and exit codes
//!
//! Every failure surfaces through [`AffectedError`]. Categories map onto exit
//! codes so CI pipelines can tell a bad invocation from a broken repository.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for msbuild-affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing projects)
  User = 1,
  /// System error (git, I/O, unreadable project files)
  System = 2,
  /// Validation failure (config rejected)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for msbuild-affected
#[derive(Debug, Error)]
pub enum AffectedError {
  /// Configuration errors
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Git operation errors
  #[error(transparent)]
  Git(#[from] GitError),

  /// Project model errors (missing or malformed project files)
  #[error(transparent)]
  Model(#[from] ModelError),

  /// Caller supplied something unusable
  #[error("Invalid input: {message}")]
  InvalidInput { message: String },

  /// I/O errors
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  /// Generic error with message and optional context
  #[error("{}", render_message(.message, .context))]
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

fn render_message(message: &str, context: &Option<String>) -> String {
  match context {
    Some(ctx) => format!("{}\n{}", message, ctx),
    None => message.to_string(),
  }
}

impl AffectedError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    AffectedError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    AffectedError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Create an invalid-input error
  pub fn invalid_input(msg: impl Into<String>) -> Self {
    AffectedError::InvalidInput { message: msg.into() }
  }

  /// Add context to an existing error
  ///
  /// Only free-form messages carry context; categorized errors are already
  /// specific enough and pass through unchanged.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      AffectedError::Message { message, context, help } => AffectedError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      AffectedError::Io(err) => AffectedError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      AffectedError::Config(ConfigError::Invalid { .. }) => ExitCode::Validation,
      AffectedError::Config(_) => ExitCode::User,
      AffectedError::Git(_) => ExitCode::System,
      AffectedError::Model(ModelError::ProjectNotFound { .. }) => ExitCode::User,
      AffectedError::Model(_) => ExitCode::System,
      AffectedError::InvalidInput { .. } => ExitCode::User,
      AffectedError::Io(_) => ExitCode::System,
      AffectedError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      AffectedError::Config(e) => e.help_message(),
      AffectedError::Git(e) => e.help_message(),
      AffectedError::Model(e) => e.help_message(),
      AffectedError::InvalidInput { .. } => {
        Some("Traversal projects are recognized by extension: `.proj` unless `[traversal] extension` says otherwise.".to_string())
      }
      AffectedError::Message { help, .. } => help.clone(),
      AffectedError::Io(_) => None,
    }
  }
}

impl From<String> for AffectedError {
  fn from(msg: String) -> Self {
    AffectedError::message(msg)
  }
}

impl From<&str> for AffectedError {
  fn from(msg: &str) -> Self {
    AffectedError::message(msg)
  }
}

impl From<serde_json::Error> for AffectedError {
  fn from(err: serde_json::Error) -> Self {
    AffectedError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for AffectedError {
  fn from(err: glob::PatternError) -> Self {
    AffectedError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<walkdir::Error> for AffectedError {
  fn from(err: walkdir::Error) -> Self {
    match err.path() {
      Some(path) => AffectedError::message(format!("Failed to enumerate {}: {}", path.display(), err)),
      None => AffectedError::message(format!("Failed to enumerate: {}", err)),
    }
  }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Config file exists but could not be parsed
  #[error("Failed to parse {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },

  /// Config parsed but a value is unusable
  #[error("Invalid configuration value for `{field}`: {reason}")]
  Invalid { field: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Parse { .. } => Some("Check the TOML syntax of your affected.toml.".to_string()),
      ConfigError::Invalid { field, .. } if field.starts_with("prediction") => Some(format!(
        "Known predictors: {}",
        crate::prediction::catalog::PREDICTOR_NAMES.join(", ")
      )),
      ConfigError::Invalid { .. } => None,
    }
  }
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
  /// Git command failed
  #[error("Git command failed: {command}\n{stderr}")]
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  #[error("Git repository not found at: {}", .path.display())]
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::CommandFailed { stderr, .. } if stderr.contains("unknown revision") => {
        Some("Fetch the base ref first (e.g. `git fetch origin main`) or pass --files explicitly.".to_string())
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run inside a git checkout or pass changed files with --files: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

/// Project model errors raised by the model provider
#[derive(Debug, Error)]
pub enum ModelError {
  /// Project file does not exist
  #[error("Project file not found: {}", .path.display())]
  ProjectNotFound { path: PathBuf },

  /// Project file is not well-formed
  #[error("Failed to parse project {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },
}

impl ModelError {
  fn help_message(&self) -> Option<String> {
    match self {
      ModelError::ProjectNotFound { .. } => {
        Some("Check the path, or the ProjectReference items pointing at it.".to_string())
      }
      ModelError::Parse { .. } => None,
    }
  }
}

/// Result type alias for msbuild-affected
pub type AffectedResult<T> = Result<T, AffectedError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<AffectedError>,
{
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &AffectedError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
