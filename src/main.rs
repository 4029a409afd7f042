//! driver-slimmer - Main entry point
//!
//! Without arguments the interactive entry point runs; with arguments the
//! batch pipeline runs and the process exits.

use std::process::ExitCode;

use driver_slimmer::{
    run_batch, BatchOutcome, BatchRequest, BusyIndicator, CatalogFile, Cli, FaultSink, Mode,
    OsFileSystem,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides; quiet by default so batch runs print nothing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main application entry point
fn main() -> ExitCode {
    // Initialize logging first
    init_logger();

    // Capture faults before any work starts
    let sink = FaultSink::install();
    debug!("driver-slimmer starting up");

    match Cli::mode_from_env() {
        Mode::Interactive => {
            info!("No arguments given, starting interactive mode");
            match sink.run_interactive(run_interactive) {
                Some(()) => ExitCode::SUCCESS,
                None => ExitCode::FAILURE,
            }
        }
        Mode::Batch(request) => run_batch_mode(&request),
    }
}

/// Interactive entry point. The graphical frontend is not part of this
/// build, so it explains the batch usage instead.
fn run_interactive() {
    eprintln!("No graphical frontend is available. Run in batch mode:\n");
    eprintln!("{}", Cli::usage());
}

/// Run the batch pipeline with the file-backed collaborators
fn run_batch_mode(request: &BatchRequest) -> ExitCode {
    let result = run_batch(
        request,
        &CatalogFile,
        &CatalogFile,
        &OsFileSystem,
        &BusyIndicator::global(),
    );

    match result {
        Ok(BatchOutcome::Skipped) => ExitCode::SUCCESS,
        Ok(BatchOutcome::Completed(summary)) => {
            info!("Batch run finished: {}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Batch run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
