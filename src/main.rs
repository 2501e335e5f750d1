//! cadstar-pcb-import: converts a CADSTAR PCB archive into a host board
//!
//! Reads the archive as JSON, runs the import and writes the resulting board
//! and project as JSON.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use cadstar_pcb_import::archive::Archive;
use cadstar_pcb_import::board::{Board, Footprint, Project};
use cadstar_pcb_import::config::{self, Config};
use cadstar_pcb_import::error::Error;
use cadstar_pcb_import::import::{import_archive, ImportReport};

/// Imports a CADSTAR PCB archive into a board.
///
/// Layers without an override in the configuration are mapped to their
/// default host layer.
#[derive(Parser, Debug)]
#[command(name = "cadstar-pcb-import")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Archive to import, as JSON
    #[arg(value_name = "ARCHIVE")]
    archive: PathBuf,

    /// Write the board here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Everything written for one run.
#[derive(Serialize)]
struct Output<'a> {
    board: &'a Board,
    project: &'a Project,
    library: &'a IndexMap<String, Footprint>,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Imports the archive and writes the result.
fn run(args: &Args, cfg: &Config) -> Result<ImportReport, Error> {
    info!(archive = %args.archive.display(), "Reading archive");
    let archive = Archive::read(&args.archive)?;

    let mut board = Board::new();
    let mut project = Project::default();
    let mut resolver = cfg.import.layer_resolver();
    let report = import_archive(
        &archive,
        &mut board,
        Some(&mut project),
        &mut resolver,
        cfg.import.options(),
    )?;

    let json = serde_json::to_string_pretty(&Output {
        board: &board,
        project: &project,
        library: &report.library,
    })?;
    write_output(args.output.as_deref(), &json)?;

    eprintln!(
        "Imported {}: {} footprints, {} tracks, {} vias, {} zones, {} nets, {} warnings",
        args.archive.display(),
        board.footprints().count(),
        board.tracks().count(),
        board.vias().count(),
        board.zones().count(),
        board.nets().len(),
        report.diagnostics.warning_count(),
    );
    Ok(report)
}

fn write_output(path: Option<&Path>, json: &str) -> Result<(), Error> {
    match path {
        Some(path) => std::fs::write(path, json).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").map_err(|source| Error::Write {
                path: PathBuf::from("-"),
                source,
            })
        }
    }
}

/// Entry point for the cadstar-pcb-import command.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nConfig read from: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    if !args.quiet {
        eprintln!(
            "cadstar-pcb-import {}  Copyright (C) 2026  The Embedded Society",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
        eprintln!("This is free software, licensed under GPL-3.0-or-later.");
        eprintln!();
    }

    match run(&args, &cfg) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Import failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
