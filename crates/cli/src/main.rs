use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;
mod progress;

use cmd::{ConfigArgs, cmd_plan, cmd_status, cmd_sync, cmd_verify};

/// patchsync - keep a local file tree in sync with a remote content manifest
#[derive(Parser)]
#[command(name = "patchsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(flatten)]
  config: ConfigArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate the local tree and download missing or changed files
  Sync,

  /// Show what a sync would download, without changing anything
  Plan {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Re-hash local files and drop stale records from the local index
  Verify,

  /// Show the contents of the local index
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.resolve()?;

  match cli.command {
    Commands::Sync => cmd_sync(config),
    Commands::Plan { json } => cmd_plan(config, cli.verbose, json),
    Commands::Verify => cmd_verify(config, cli.verbose),
    Commands::Status { json } => cmd_status(config, cli.verbose, json),
  }
}
