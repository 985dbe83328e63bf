use clap::{Parser, Subcommand};
use msbuild_affected::commands::{self, ChangeSource};
use msbuild_affected::core::context::AnalysisContext;
use msbuild_affected::core::error::{AffectedError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Find the MSBuild projects affected by a change set
#[derive(Parser)]
#[command(name = "msbuild-affected")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Debug logging on stderr (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show which projects are affected by changes
  Affected {
    /// Traversal project or single project to build the graph from
    #[arg(long)]
    root: PathBuf,
    /// Git ref to compare against HEAD (default: origin/main)
    #[arg(long, default_value = "origin/main")]
    since: String,
    /// Start ref (for SHA pair mode)
    #[arg(long, conflicts_with = "since", requires = "to")]
    from: Option<String>,
    /// End ref (for SHA pair mode)
    #[arg(long, requires = "from")]
    to: Option<String>,
    /// Changed files given explicitly instead of asking git
    #[arg(long, num_args = 1.., conflicts_with_all = ["since", "from"])]
    files: Vec<PathBuf>,
    /// Output format: text (default), json, names
    #[arg(long, default_value = "text")]
    format: String,
    /// Show the changed files without building the graph
    #[arg(long)]
    dry_run: bool,
  },

  /// List the member projects of a traversal project
  Discover {
    /// Traversal project (e.g. dirs.proj)
    traversal: PathBuf,
    /// Output format: text (default), json, names
    #[arg(long, default_value = "text")]
    format: String,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
  let default_level = if verbose { "msbuild_affected=debug" } else { "msbuild_affected=warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(AffectedError::Io(e).context("Failed to get current directory")),
  };

  // Config, comparer and predictor registry load once for every command
  let ctx = match AnalysisContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Affected {
      root,
      since,
      from,
      to,
      files,
      format,
      dry_run,
    } => {
      let source = if !files.is_empty() {
        ChangeSource::Files(files)
      } else if let (Some(from), Some(to)) = (from, to) {
        ChangeSource::Range { from, to }
      } else {
        ChangeSource::Since(since)
      };
      commands::run_affected(&ctx, &root, source, &format, dry_run)
    }
    Commands::Discover { traversal, format } => commands::run_discover(&ctx, &traversal, &format),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: AffectedError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
