//! Tests for `msbuild-affected affected`

use crate::helpers::{TestRepo, run_cli, run_cli_raw, stdout_lines};
use anyhow::Result;

/// dirs.proj -> {a, app}, app -> lib
fn setup_repo() -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.add_project("a", "a", &[])?;
  repo.add_project("lib", "lib", &[])?;
  repo.add_project("app", "app", &["../lib/lib.csproj"])?;
  repo.add_traversal(
    "dirs.proj",
    r#"    <ProjectReference Include="a/a.csproj" />
    <ProjectReference Include="app/app.csproj" />"#,
  )?;
  repo.write_file(
    "Directory.Packages.props",
    "<Project>\n  <PropertyGroup>\n    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>\n  </PropertyGroup>\n</Project>\n",
  )?;
  repo.commit("Add projects")?;
  repo.mark_baseline()?;
  Ok(repo)
}

#[test]
fn test_source_change_affects_owning_project() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("a/a.cs", "namespace a;\n\npublic static class Changed { }\n")?;
  repo.commit("Change a")?;

  let output = run_cli(
    &repo.path,
    &["affected", "--root", "dirs.proj", "--since", "origin/main", "--format", "names"],
  )?;

  assert_eq!(stdout_lines(&output), vec!["a"]);
  Ok(())
}

#[test]
fn test_central_package_file_is_ignored() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("Directory.Packages.props", "<Project />\n")?;
  repo.commit("Touch packages")?;

  let output = run_cli(&repo.path, &["affected", "--root", "dirs.proj"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Changed files: 1"), "stdout: {}", stdout);
  assert!(stdout.contains("Projects in graph: 3 (2 entry points)"), "stdout: {}", stdout);
  assert!(stdout.contains("Affected projects: 0"), "stdout: {}", stdout);
  Ok(())
}

#[test]
fn test_referenced_project_file_affects_referrer() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file(
    "lib/lib.csproj",
    "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <Nullable>enable</Nullable>\n  </PropertyGroup>\n</Project>\n",
  )?;
  repo.commit("Edit lib project")?;

  let output = run_cli(&repo.path, &["affected", "--root", "dirs.proj", "--format", "names"])?;

  assert_eq!(stdout_lines(&output), vec!["lib", "app"]);
  Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("lib/lib.cs", "namespace lib;\n\npublic static class Changed { }\n")?;
  repo.commit("Change lib")?;

  let output = run_cli(&repo.path, &["affected", "--root", "dirs.proj", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(json["changed_files"], serde_json::json!(["lib/lib.cs"]));
  assert_eq!(json["affected"][0]["name"], "lib");
  assert_eq!(json["affected"][0]["path"], "lib/lib.csproj");
  assert_eq!(json["summary"]["graph_projects_count"], 3);
  assert_eq!(json["summary"]["entry_points_count"], 2);
  assert_eq!(json["summary"]["affected_count"], 1);
  Ok(())
}

#[test]
fn test_explicit_files_skip_git() -> Result<()> {
  let repo = setup_repo()?;

  let output = run_cli(
    &repo.path,
    &[
      "affected",
      "--root",
      "dirs.proj",
      "--format",
      "names",
      "--files",
      "app/app.cs",
      "a/a.csproj",
    ],
  )?;

  assert_eq!(stdout_lines(&output), vec!["app", "a"]);
  Ok(())
}

#[test]
fn test_sha_range() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("a/a.cs", "namespace a;\n\npublic static class First { }\n")?;
  let first = repo.commit("Change a")?;
  repo.write_file("app/app.cs", "namespace app;\n\npublic static class Second { }\n")?;
  let second = repo.commit("Change app")?;

  let output = run_cli(
    &repo.path,
    &[
      "affected",
      "--root",
      "dirs.proj",
      "--from",
      &first,
      "--to",
      &second,
      "--format",
      "names",
    ],
  )?;

  assert_eq!(stdout_lines(&output), vec!["app"]);
  Ok(())
}

#[test]
fn test_single_project_root() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("lib/lib.cs", "namespace lib;\n\npublic static class Changed { }\n")?;
  repo.commit("Change lib")?;

  // Graph rooted at app still reaches lib through its reference
  let output = run_cli(
    &repo.path,
    &["affected", "--root", "app/app.csproj", "--format", "names"],
  )?;

  assert_eq!(stdout_lines(&output), vec!["lib"]);
  Ok(())
}

#[test]
fn test_dry_run() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("a/a.cs", "namespace a;\n\npublic static class Changed { }\n")?;
  repo.commit("Change a")?;

  let output = run_cli(&repo.path, &["affected", "--root", "dirs.proj", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("DRY RUN"));
  assert!(stdout.contains("a/a.cs"));
  assert!(!stdout.contains("Affected projects"));
  Ok(())
}

#[test]
fn test_missing_root_is_user_error() -> Result<()> {
  let repo = setup_repo()?;

  let output = run_cli_raw(
    &repo.path,
    &["affected", "--root", "missing.proj", "--files", "a/a.cs"],
  )?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Project file not found"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_unknown_format_is_rejected() -> Result<()> {
  let repo = setup_repo()?;

  let output = run_cli_raw(
    &repo.path,
    &["affected", "--root", "dirs.proj", "--format", "yaml", "--files", "a/a.cs"],
  )?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Unknown format 'yaml'"), "stderr: {}", stderr);
  assert!(stderr.contains("Valid formats: text, json, names"), "stderr: {}", stderr);
  Ok(())
}

#[cfg(unix)]
#[test]
fn test_file_names_git_would_quote() -> Result<()> {
  let repo = setup_repo()?;
  repo.write_file("app/Say \"hi\".cs", "namespace app;\n")?;
  repo.write_file("app/tab\there.cs", "namespace app;\n")?;
  repo.commit("Add oddly named sources")?;

  let output = run_cli(&repo.path, &["affected", "--root", "dirs.proj", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(
    json["changed_files"],
    serde_json::json!(["app/Say \"hi\".cs", "app/tab\there.cs"])
  );
  assert_eq!(json["affected"][0]["name"], "app");
  assert_eq!(json["summary"]["affected_count"], 1);
  Ok(())
}
