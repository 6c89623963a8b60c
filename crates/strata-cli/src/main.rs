//! Strata CLI - Command-line interface for Strata
//!
//! Turns indexer snapshots into a laid-out class inheritance graph and
//! serves it to renderers.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "strata")]
#[command(author = "Strata Contributors")]
#[command(version)]
#[command(about = "Layered class inheritance graphs from indexer snapshots", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default strata.json
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the class graph and print a summary
    Build {
        /// Event files, applied in order
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
    },

    /// Print node levels and positions
    Layout {
        /// Event files, applied in order
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Output the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a standalone graph document
    Export {
        /// Event files, applied in order
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "strata-graph.html")]
        output: PathBuf,

        /// Template with __STRATA_NODES__ and __STRATA_EDGES__ markers
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Start the sync server
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Headless mode: bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,

        /// Directory of event files to watch
        #[arg(short, long)]
        watch: Option<PathBuf>,

        /// Event files to load before serving
        snapshots: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match config::StrataConfig::load() {
        Ok(config) => run(cli.command, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &config::StrataConfig) -> commands::Result<()> {
    match command {
        Commands::Init { path } => commands::init(&path),
        Commands::Build { snapshots } => commands::build(&snapshots, config),
        Commands::Layout { snapshots, json } => commands::layout(&snapshots, json, config),
        Commands::Export {
            snapshots,
            output,
            template,
        } => commands::export(&snapshots, &output, template.as_deref(), config),
        Commands::Serve {
            port,
            headless,
            watch,
            snapshots,
        } => commands::serve(port, headless, watch, &snapshots, config).await,
    }
}
