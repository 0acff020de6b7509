//! docdeploy: deploy and remove remote command documents in parallel batches.
//!
//! # Usage
//!
//! ```text
//! docdeploy [global options] deploy|up [--yes] [--all] [--parallels N] [path...]
//! docdeploy [global options] remove|delete|down [--yes] [--all] [--parallels N] [path...]
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{deploy::DeployArgs, remove::RemoveArgs, GlobalArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "docdeploy",
    version,
    about = "Deploy and remove command documents from declarative descriptors",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update documents, then sync their permissions and tags.
    #[command(visible_alias = "up")]
    Deploy(DeployArgs),

    /// Unshare and delete documents.
    #[command(visible_aliases = ["delete", "down"])]
    Remove(RemoveArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();

    // Before parsing, so `.env` values can back the `env =` flag fallbacks.
    docdeploy_core::dotenv::load_dot_env().context("failed to load env file")?;

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Deploy(args) => args.run(&cli.global).await,
            Commands::Remove(args) => args.run(&cli.global).await,
        }
    })
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
