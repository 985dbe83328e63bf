//! Tests for `msbuild-affected discover`

use crate::helpers::{TestRepo, run_cli, run_cli_raw, stdout_lines};
use anyhow::Result;

#[test]
fn test_glob_members() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("src/y", "y", &[])?;
  repo.add_project("src/x", "x", &[])?;
  repo.add_project("src/legacy/old", "old", &[])?;
  repo.add_traversal(
    "dirs.proj",
    r#"    <ProjectReference Include="src/**/*.csproj" />
    <ProjectReference Remove="src/legacy/**" />"#,
  )?;

  let output = run_cli(&repo.path, &["discover", "dirs.proj", "--format", "json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(json["glob_based"], true);
  assert_eq!(json["members"], serde_json::json!(["src/x/x.csproj", "src/y/y.csproj"]));
  assert_eq!(json["count"], 2);
  Ok(())
}

#[test]
fn test_explicit_members_keep_order() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("b", "b", &[])?;
  repo.add_project("a", "a", &[])?;
  repo.add_traversal(
    "build.proj",
    r#"    <ProjectReference Include="b/b.csproj" />
    <ProjectReference Include="a/a.csproj" />
    <ProjectReference Include="b\b.csproj" />"#,
  )?;

  let output = run_cli(&repo.path, &["discover", "build.proj", "--format", "names"])?;

  assert_eq!(stdout_lines(&output), vec!["b", "a"]);

  let text = run_cli(&repo.path, &["discover", "build.proj"])?;
  assert!(String::from_utf8_lossy(&text.stdout).contains("Members: 2 (explicit)"));
  Ok(())
}

#[test]
fn test_wrong_extension_is_rejected() -> Result<()> {
  let repo = TestRepo::new()?;
  let project = repo.add_project("a", "a", &[])?;

  let output = run_cli_raw(&repo.path, &["discover", &project.to_string_lossy()])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("not a traversal project"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_configured_extension() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("a", "a", &[])?;
  repo.add_traversal("all.traversal", r#"    <ProjectReference Include="a/a.csproj" />"#)?;
  repo.write_file("affected.toml", "[traversal]\nextension = \"traversal\"\n")?;

  let output = run_cli(&repo.path, &["discover", "all.traversal", "--format", "names"])?;
  assert_eq!(stdout_lines(&output), vec!["a"]);

  // .proj is no longer a traversal extension
  repo.add_traversal("dirs.proj", r#"    <ProjectReference Include="a/a.csproj" />"#)?;
  let rejected = run_cli_raw(&repo.path, &["discover", "dirs.proj"])?;
  assert_eq!(rejected.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_invalid_config_is_validation_error() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_traversal("dirs.proj", "")?;
  repo.write_file("affected.toml", "[prediction]\ndisabled = [\"NoSuchPredictor\"]\n")?;

  let output = run_cli_raw(&repo.path, &["discover", "dirs.proj"])?;

  assert_eq!(output.status.code(), Some(3));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("NoSuchPredictor"), "stderr: {}", stderr);
  assert!(stderr.contains("Known predictors"), "stderr: {}", stderr);
  Ok(())
}
