use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// layersync - batch document-variant export
#[derive(Parser)]
#[command(name = "layersync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a batch file against a document and export every task
  Run {
    /// Path to the batch file (default: batch.json)
    #[arg(default_value = "batch.json")]
    batch: PathBuf,

    /// Document to open; overrides the batch file's settings
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Directory exports land in; overrides the batch file's settings
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Export format extension (png, jpg); overrides the batch file's settings
    #[arg(long)]
    format: Option<String>,

    /// Suffix appended to every export name; overrides the batch file's settings
    #[arg(long)]
    suffix: Option<String>,

    /// Keep processing tasks when an export fails
    #[arg(long)]
    keep_going: bool,
  },

  /// Resolve every task path without touching the document
  Plan {
    /// Path to the batch file (default: batch.json)
    #[arg(default_value = "batch.json")]
    batch: PathBuf,

    /// Document to open; overrides the batch file's settings
    #[arg(short, long)]
    document: Option<PathBuf>,
  },

  /// Show a document's element tree
  Info {
    /// Path to the document file
    document: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .init();

  match cli.command {
    Commands::Run {
      batch,
      document,
      export_dir,
      format,
      suffix,
      keep_going,
    } => cmd::cmd_run(
      &batch,
      cmd::RunOverrides {
        document,
        export_dir,
        format,
        suffix,
        keep_going,
      },
    ),
    Commands::Plan { batch, document } => cmd::cmd_plan(&batch, document.as_deref()),
    Commands::Info { document } => cmd::cmd_info(&document),
  }
}
