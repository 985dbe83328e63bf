//! `msbuild-affected affected` - Show which projects are affected by changes
//!
//! Changed files come from git (`--since`, or `--from`/`--to`) or are given
//! explicitly with `--files`. The project graph is built from `--root`,
//! which is either a traversal project or a single project.

use super::{OutputFormat, display_path};
use crate::core::context::AnalysisContext;
use crate::core::error::AffectedResult;
use crate::core::vcs::SystemGit;
use crate::graph::affected::{AffectedAnalysis, analyze};
use crate::graph::ProjectGraph;
use std::path::{Path, PathBuf};

/// Where the changed-file list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
  /// `<since>..HEAD`
  Since(String),
  /// `<from>..<to>`
  Range { from: String, to: String },
  /// Explicit paths, relative ones resolved against the context root
  Files(Vec<PathBuf>),
}

/// Run the affected command
pub fn run_affected(
  ctx: &AnalysisContext,
  root: &Path,
  source: ChangeSource,
  format: &str,
  dry_run: bool,
) -> AffectedResult<()> {
  let output_format = OutputFormat::parse(format)?;
  let root = ctx.resolve_path(root);

  let changed_files = get_changed_files(ctx, &source)?;
  tracing::debug!("{} changed files from {:?}", changed_files.len(), source);

  if dry_run {
    println!(
      "DRY RUN: Would analyze {} changed files against {}",
      changed_files.len(),
      display_path(&ctx.root, &root)
    );
    for file in &changed_files {
      println!("  - {}", display_path(&ctx.root, file));
    }
    return Ok(());
  }

  let graph = ProjectGraph::load(ctx, &root)?;
  let analysis = analyze(&ctx.resolver(), &graph, &changed_files)?;

  display_results(ctx, &graph, &analysis, output_format)
}

/// Changed files as absolute paths
fn get_changed_files(ctx: &AnalysisContext, source: &ChangeSource) -> AffectedResult<Vec<PathBuf>> {
  let (from, to) = match source {
    ChangeSource::Files(files) => return Ok(files.iter().map(|f| ctx.resolve_path(f)).collect()),
    ChangeSource::Since(since) => (since.as_str(), "HEAD"),
    ChangeSource::Range { from, to } => (from.as_str(), to.as_str()),
  };

  let git = SystemGit::open(&ctx.root)?;
  git.changed_files_between(from, to)
}

fn display_results(
  ctx: &AnalysisContext,
  graph: &ProjectGraph,
  analysis: &AffectedAnalysis,
  format: OutputFormat,
) -> AffectedResult<()> {
  match format {
    OutputFormat::Text => display_text(ctx, graph, analysis),
    OutputFormat::Json => display_json(ctx, graph, analysis)?,
    OutputFormat::Names => display_names(analysis),
  }
  Ok(())
}

/// Display results in human-readable text format
fn display_text(ctx: &AnalysisContext, graph: &ProjectGraph, analysis: &AffectedAnalysis) {
  println!("Affected Analysis");
  println!("=================");
  println!();

  println!("Changed files: {}", analysis.changed_files.len());
  if !analysis.changed_files.is_empty() && analysis.changed_files.len() <= 20 {
    for file in &analysis.changed_files {
      println!("  {}", display_path(&ctx.root, file));
    }
    println!();
  }

  println!(
    "Projects in graph: {} ({} entry points)",
    graph.len(),
    graph.entry_points().len()
  );
  println!("Affected projects: {}", analysis.projects.len());
  for project in &analysis.projects {
    println!("  📦 {} ({})", project.name(), display_path(&ctx.root, &project.path));
  }
}

/// Display results in JSON format
fn display_json(ctx: &AnalysisContext, graph: &ProjectGraph, analysis: &AffectedAnalysis) -> AffectedResult<()> {
  use serde_json::json;

  let changed: Vec<_> = analysis
    .changed_files
    .iter()
    .map(|file| display_path(&ctx.root, file))
    .collect();

  let projects: Vec<_> = analysis
    .projects
    .iter()
    .map(|project| {
      json!({
          "name": project.name(),
          "path": display_path(&ctx.root, &project.path),
      })
    })
    .collect();

  let output = json!({
      "changed_files": changed,
      "affected": projects,
      "summary": {
          "changed_files_count": analysis.changed_files.len(),
          "graph_projects_count": graph.len(),
          "entry_points_count": graph.entry_points().len(),
          "affected_count": analysis.projects.len()
      }
  });

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Display only project names, one per line
fn display_names(analysis: &AffectedAnalysis) {
  for name in analysis.names() {
    println!("{}", name);
  }
}
