//! `msbuild-affected discover` - List the members of a traversal project

use super::{OutputFormat, display_path};
use crate::core::context::AnalysisContext;
use crate::core::error::AffectedResult;
use std::path::{Path, PathBuf};

/// Run the discover command
pub fn run_discover(ctx: &AnalysisContext, traversal: &Path, format: &str) -> AffectedResult<()> {
  let output_format = OutputFormat::parse(format)?;
  let traversal = ctx.resolve_path(traversal);
  let discoverer = ctx.discoverer();

  let members = discoverer.discover_projects(&traversal)?;
  let glob_based = discoverer.is_glob_based(&traversal)?;

  match output_format {
    OutputFormat::Text => {
      let mode = if glob_based { "glob" } else { "explicit" };
      println!("Traversal: {}", display_path(&ctx.root, &traversal));
      println!("Members: {} ({})", members.len(), mode);
      for member in &members {
        println!("  📦 {}", display_path(&ctx.root, member));
      }
    }
    OutputFormat::Json => {
      let output = serde_json::json!({
          "traversal": display_path(&ctx.root, &traversal),
          "glob_based": glob_based,
          "members": relative(ctx, &members),
          "count": members.len()
      });
      println!("{}", serde_json::to_string_pretty(&output)?);
    }
    OutputFormat::Names => {
      for member in &members {
        let name = member.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        println!("{}", name);
      }
    }
  }

  Ok(())
}

fn relative(ctx: &AnalysisContext, paths: &[PathBuf]) -> Vec<String> {
  paths.iter().map(|p| display_path(&ctx.root, p)).collect()
}
