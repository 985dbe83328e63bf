//! System git backend
//!
//! Shells out to the `git` binary with an isolated environment. Only the
//! operations needed to turn a ref range into a change set live here.

use crate::core::error::{AffectedError, AffectedResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> AffectedResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(AffectedError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(AffectedError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reported = PathBuf::from(stdout.trim());

    // git reports the symlink-resolved top level; keep the caller's spelling of it
    let work_tree = path
      .ancestors()
      .find(|ancestor| same_location(ancestor, &reported))
      .map(Path::to_path_buf)
      .unwrap_or(reported);

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree,
    })
  }

  /// Files changed between two refs, in git's output order.
  ///
  /// Renames and copies report both the old and the new path, since a
  /// project that consumed either one is affected. Paths are read from
  /// NUL-separated output, so names git would C-quote arrive verbatim.
  pub fn changed_files_between(&self, from: &str, to: &str) -> AffectedResult<Vec<PathBuf>> {
    let output = self
      .git_cmd()
      .args(["diff", "--name-status", "-z", from, to])
      .output()
      .context("Failed to run git diff")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(AffectedError::Git(GitError::CommandFailed {
        command: format!("git diff --name-status -z {} {}", from, to),
        stderr: stderr.to_string(),
      }));
    }

    let stdout = String::from_utf8(output.stdout)
      .map_err(|e| AffectedError::message(format!("git diff produced non UTF-8 output: {}", e)))?;
    let changes = parse_name_status(&stdout, &self.work_tree);
    tracing::debug!("git diff {}..{}: {} changed paths", from, to, changes.len());
    Ok(changes)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

fn same_location(a: &Path, b: &Path) -> bool {
  match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
    (Ok(a), Ok(b)) => a == b,
    _ => false,
  }
}

/// Parse `git diff --name-status -z` output into absolute paths.
///
/// Records are `STATUS\0PATH\0`; renames and copies carry a score in the
/// status (`R100`) and two paths, old then new.
fn parse_name_status(output: &str, work_tree: &Path) -> Vec<PathBuf> {
  let mut changes = Vec::new();
  let mut fields = output.split('\0');

  while let Some(status) = fields.next() {
    let path_count = match status.chars().next() {
      Some('R' | 'C') => 2,
      Some(_) => 1,
      None => continue,
    };
    for path in fields.by_ref().take(path_count).filter(|p| !p.is_empty()) {
      changes.push(work_tree.join(path));
    }
  }

  changes
}
