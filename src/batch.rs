//! Non-interactive batch run.
//!
//! Sequence: read catalogs from the installer directory, read and parse the
//! selection file, flag every catalog entry, hand the catalogs to the mutator.
//! Each step runs once; nothing is retried.

use std::path::PathBuf;

use crate::decision::{apply_selection, DecisionSummary};
use crate::error::Result;
use crate::installer::{CatalogReader, FileSystem, InstallerMutator};
use crate::selection::SelectionDocument;
use crate::status::BusyIndicator;

/// Paths a batch run needs. Both must be present for anything to happen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    pub extracted_installer: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// How a batch run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A required path was missing; nothing was read or changed
    Skipped,
    /// The mutator was invoked with these decisions
    Completed(DecisionSummary),
}

/// Drive one batch run.
///
/// Returns [`BatchOutcome::Skipped`] before any I/O when either path is
/// missing. Failing to read the catalogs or the selection file aborts the
/// run. A mutator failure is logged only; the mutator is called exactly once
/// and its result does not change the outcome.
pub fn run_batch(
    request: &BatchRequest,
    reader: &dyn CatalogReader,
    mutator: &dyn InstallerMutator,
    fs: &dyn FileSystem,
    busy: &BusyIndicator,
) -> Result<BatchOutcome> {
    let (Some(installer_dir), Some(config)) = (&request.extracted_installer, &request.config)
    else {
        tracing::debug!("Batch arguments incomplete, nothing to do");
        return Ok(BatchOutcome::Skipped);
    };

    let _busy = busy.begin();
    tracing::info!(
        installer = %installer_dir.display(),
        selection = %config.display(),
        "Starting batch run"
    );

    let mut catalogs = reader.read_catalogs(installer_dir)?;

    let lines = fs.read_lines(config)?;
    let document = SelectionDocument::from_lines(&lines);

    let summary = apply_selection(&document, &mut catalogs);
    tracing::info!("Decisions applied: {}", summary);

    if let Err(e) = mutator.modify(installer_dir, &catalogs) {
        tracing::error!("Installer modification failed: {}", e);
    }

    Ok(BatchOutcome::Completed(summary))
}
