//! CLI command implementations.

use crate::config::{StrataConfig, CONFIG_FILE};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::BufWriter;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strata_core::{Diagnostic, IndexerEvent, ProjectState};
use strata_graph::export::{self, DEFAULT_TEMPLATE};
use strata_graph::Rebuild;
use strata_server::{SessionState, SyncServer, SyncServerConfig};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Writes a default `strata.json` into `path`.
pub fn init(path: &Path) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(path)?;
    fs::write(&config_path, serde_json::to_string_pretty(&StrataConfig::default())?)?;

    println!("{} Wrote {}", "✓".green(), config_path.display());
    println!("  Run {} to build the class graph", "strata build <snapshot.json>".cyan());

    Ok(())
}

/// Ingests event files in order, showing a spinner.
fn ingest(snapshots: &[PathBuf]) -> Result<ProjectState> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));

    let state = ingest_files(snapshots, |path| {
        spinner.set_message(format!("Reading {}", path.display()));
    });

    spinner.finish_and_clear();
    state
}

fn ingest_files(snapshots: &[PathBuf], mut on_file: impl FnMut(&Path)) -> Result<ProjectState> {
    let mut state = ProjectState::new();
    for path in snapshots {
        on_file(path);
        let events =
            IndexerEvent::read_file(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        for event in events {
            state.apply(event);
        }
    }
    Ok(state)
}

fn print_diagnostics<'a>(diagnostics: impl Iterator<Item = &'a Diagnostic>) {
    let diagnostics: Vec<_> = diagnostics.collect();
    if diagnostics.is_empty() {
        return;
    }

    println!("\n{} {} skipped entries:", "⚠".yellow(), diagnostics.len());
    for diagnostic in diagnostics.iter().take(5) {
        println!("  {}", diagnostic.to_string().yellow());
    }
    if diagnostics.len() > 5 {
        println!("  ... and {} more", diagnostics.len() - 5);
    }
}

/// Import edges between indexed files.
fn import_links(state: &ProjectState) -> usize {
    (0..state.files().len())
        .map(|file| state.imports_of(file).len())
        .sum()
}

/// Builds the class graph and prints a summary.
pub fn build(snapshots: &[PathBuf], config: &StrataConfig) -> Result<()> {
    println!("{}", "Building class graph...".cyan());

    let state = ingest(snapshots)?;
    let rebuild = Rebuild::run(&state, &config.layout);
    let stats = rebuild.stats();

    println!(
        "{} {} classes, {} inheritance edges",
        "✓".green(),
        stats.node_count.to_string().cyan(),
        stats.edge_count.to_string().cyan()
    );
    println!(
        "  {} indexed files ({} declare classes), {} import links",
        state.files().len(),
        stats.class_files,
        import_links(&state)
    );
    if let Some(progress) = state.progress() {
        println!("  Indexer last reported {} at {}%", progress.phase, progress.percent);
    }

    print_diagnostics(state.diagnostics().chain(rebuild.diagnostics.iter()));

    Ok(())
}

/// Prints the laid-out graph, level by level or as JSON.
pub fn layout(snapshots: &[PathBuf], json: bool, config: &StrataConfig) -> Result<()> {
    let state = ingest(snapshots)?;
    let rebuild = Rebuild::run(&state, &config.layout);

    if json {
        println!("{}", serde_json::to_string_pretty(&rebuild.snapshot())?);
        return Ok(());
    }

    for (level, ids) in rebuild.layout.levels().iter().enumerate() {
        println!("{}", format!("Level {}", level).bold());
        for id in ids {
            let Some(node) = rebuild.graph.get_by_id(id) else {
                continue;
            };
            println!(
                "  {} {} {}",
                node.display_name.cyan(),
                id.dimmed(),
                format!("({}, {})", node.position.x, node.position.y).dimmed()
            );
        }
    }

    Ok(())
}

/// Writes the standalone export document.
pub fn export(
    snapshots: &[PathBuf],
    output: &Path,
    template: Option<&Path>,
    config: &StrataConfig,
) -> Result<()> {
    let template = match template {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let state = ingest(snapshots)?;
    let snapshot = Rebuild::run(&state, &config.layout).snapshot();

    let file = File::create(output)?;
    export::write_document(&snapshot, &template, BufWriter::new(file))?;

    println!(
        "{} Exported {} classes to {}",
        "✓".green(),
        snapshot.nodes.len(),
        output.display()
    );

    Ok(())
}

/// Runs the sync server, optionally seeded from event files.
pub async fn serve(
    port: Option<u16>,
    headless: bool,
    watch: Option<PathBuf>,
    snapshots: &[PathBuf],
    config: &StrataConfig,
) -> Result<()> {
    let bind_addr = if headless { "0.0.0.0" } else { "127.0.0.1" };
    let port = port.unwrap_or(config.server.port);

    if headless {
        println!("{}", "Starting Strata server in headless mode...".cyan());
    } else {
        println!("{}", "Starting Strata server...".cyan());
    }

    let mut state = SessionState::new(config.layout);
    if !snapshots.is_empty() {
        for path in snapshots {
            for event in IndexerEvent::read_file(path)? {
                state.apply(event);
            }
        }
        let stats = state.stats();
        println!(
            "{} Loaded {} classes ({} edges)",
            "✓".green(),
            stats.node_count,
            stats.edge_count
        );
    }

    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;
    let server_config = SyncServerConfig {
        addr,
        watch_path: watch,
        debounce_ms: config.server.debounce_ms,
        layout: config.layout,
    };
    if let Some(path) = &server_config.watch_path {
        println!("  Watching {} for event files", path.display().to_string().cyan());
    }
    let server = SyncServer::with_state(server_config, state);

    println!("{} Listening on ws://{}:{}", "✓".green(), bind_addr, port);
    if headless {
        println!("  Headless mode: accepting connections from any host");
    }
    println!("  Press {} to stop", "Ctrl+C".cyan());

    server.run().await?;

    Ok(())
}
