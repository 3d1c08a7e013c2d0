//! Reviewer CLI - HTTP service that assigns pull request reviewers
//!
//! Teams, users and pull requests are kept in SQLite; every new pull request
//! gets up to two active reviewers from the author's team.

mod commands;
mod http;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reviewer_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ServeArgs, StatsArgs};

/// Pull request reviewer assignment service
#[derive(Parser, Debug)]
#[command(name = "reviewer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.config/reviewer/config.toml
    #[arg(long, global = true, env = "REVIEWER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Show review load per user
    Stats(StatsArgs),

    /// Show current configuration
    Config,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.config.as_deref(), None, None)?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter))
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    if cli.verbose {
        tracing::info!(
            bind = %config.server.bind,
            database = %config.database.path.display(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Serve(args)) => {
            args.execute(config).await?;
        }
        Some(Commands::Stats(args)) => {
            args.execute(config).await?;
        }
        Some(Commands::Config) => {
            print_config(&config, cli.config.as_deref());
        }
        Some(Commands::Version) => {
            println!("reviewer {}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("Reviewer - pull request reviewer assignment service");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config, explicit: Option<&std::path::Path>) {
    println!("Reviewer Configuration");
    println!("======================");
    println!();
    println!("Server:");
    println!("  bind: {}", config.server.bind);
    println!("  request_timeout: {:?}", config.server.request_timeout);
    println!("  shutdown_timeout: {:?}", config.server.shutdown_timeout);
    println!();
    println!("Database:");
    println!("  path: {}", config.database.path.display());
    println!("  max_connections: {}", config.database.max_connections);
    println!("  busy_timeout: {:?}", config.database.busy_timeout);
    println!();
    println!("Log:");
    println!("  filter: {}", config.log.filter);
    println!();

    let path = explicit
        .map(PathBuf::from)
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
