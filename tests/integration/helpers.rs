//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A temporary MSBuild repository with git history
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create an empty repository with one initial commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(path.join("README.md"), "# test repo\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Add an SDK-style C# project with one source file and optional references
  pub fn add_project(&self, dir: &str, name: &str, references: &[&str]) -> Result<PathBuf> {
    let project_dir = self.path.join(dir);
    std::fs::create_dir_all(&project_dir)?;

    let items: String = references
      .iter()
      .map(|r| format!("    <ProjectReference Include=\"{}\" />\n", r))
      .collect();
    let project = format!(
      r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
{}  </ItemGroup>
</Project>
"#,
      items
    );

    let project_path = project_dir.join(format!("{}.csproj", name));
    std::fs::write(&project_path, project)?;
    std::fs::write(
      project_dir.join(format!("{}.cs", name)),
      format!("namespace {};\n\npublic static class {}Entry {{ }}\n", name, name),
    )?;

    Ok(project_path)
  }

  /// Write a traversal project at the repository root
  pub fn add_traversal(&self, file_name: &str, item_group_body: &str) -> Result<PathBuf> {
    let path = self.path.join(file_name);
    std::fs::write(
      &path,
      format!(
        "<Project Sdk=\"Microsoft.Build.Traversal/4.1.0\">\n  <ItemGroup>\n{}\n  </ItemGroup>\n</Project>\n",
        item_group_body
      ),
    )?;
    Ok(path)
  }

  /// Write (or overwrite) a file relative to the repository root
  pub fn write_file(&self, relative: &str, content: &str) -> Result<()> {
    let path = self.path.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Commit current changes, returning the new HEAD SHA
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Mark the current HEAD as the `origin/main` baseline
  pub fn mark_baseline(&self) -> Result<()> {
    git(&self.path, &["update-ref", "refs/remotes/origin/main", "HEAD"])?;
    Ok(())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the CLI and return its output whatever the exit status
pub fn run_cli_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_msbuild-affected");

  Command::new(bin)
    .current_dir(cwd)
    .env_remove("RUST_LOG")
    .args(args)
    .output()
    .context("Failed to run msbuild-affected")
}

/// Run the CLI, failing unless it exits successfully
pub fn run_cli(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cli_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "msbuild-affected command failed: msbuild-affected {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Non-empty stdout lines
pub fn stdout_lines(output: &Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(String::from)
    .collect()
}
