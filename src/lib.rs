//! driver-slimmer library
//!
//! Batch pipeline for stripping an extracted driver installer down to what a
//! selection file lists: parse the selection, flag the installer catalogs,
//! hand them to the installer rewriter. Unhandled faults are captured by the
//! process-wide fault sink.

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod decision;
pub mod error;
pub mod fault_sink;
pub mod installer;
pub mod selection;
pub mod status;

// Re-export main types for convenience
pub use batch::{run_batch, BatchOutcome, BatchRequest};
pub use catalog::{DisplayComponentEntry, InstallerCatalogs, PackageEntry, ScheduledTaskEntry};
pub use cli::{Cli, Mode};
pub use decision::{apply_decisions, apply_selection, names_match, DecisionSummary, KindSummary};
pub use error::{Result, SlimmerError};
pub use fault_sink::{Diagnostic, Disposition, FaultSink, FaultSurface, WorkHandle};
pub use installer::{
    CatalogFile, CatalogReader, FileSystem, InstallerMutator, OsFileSystem, CATALOG_FILE_NAME,
};
pub use selection::{Section, SelectionDocument};
pub use status::{BusyGuard, BusyIndicator};
