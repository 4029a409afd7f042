//! Error handling module for driver-slimmer
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Selection-file syntax problems are never errors; only the three collaborator
//! failures surface here. Collaborators build their messages with `anyhow`
//! context and hand over the whole chain as text.

use thiserror::Error;

/// Main error type for driver-slimmer
#[derive(Error, Debug)]
pub enum SlimmerError {
    /// The reading collaborator could not produce catalogs
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The selection file could not be read
    #[error("Selection file error: {0}")]
    Selection(String),

    /// The mutation collaborator reported a failure
    #[error("Installer modification failed: {0}")]
    Mutation(String),
}

/// Result type alias for driver-slimmer operations
pub type Result<T> = std::result::Result<T, SlimmerError>;

// Convenient error constructors
impl SlimmerError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a selection file error
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Create a mutation error
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::Mutation(msg.into())
    }
}
