//! Collaborator contracts around an extracted installer.
//!
//! Reading an installer into catalogs and rewriting it from flagged catalogs
//! are done by other tools. The batch run only needs the three traits here:
//!
//! - [`CatalogReader`]: extracted installer directory → catalogs
//! - [`InstallerMutator`]: flagged catalogs → installer changes
//! - [`FileSystem`]: how the selection file is read
//!
//! [`CatalogFile`] is the hand-off used by the binary: the reading tool leaves
//! a `slimmer-catalog.json` in the installer directory and the rewriting tool
//! picks the flagged copy up from the same place.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::catalog::InstallerCatalogs;
use crate::error::{Result, SlimmerError};
use crate::selection::split_lines;

/// File name of the catalog hand-off inside an extracted installer
pub const CATALOG_FILE_NAME: &str = "slimmer-catalog.json";

/// Produces the three catalogs for an extracted installer.
pub trait CatalogReader {
    /// Read catalogs from `installer_dir`. Every entry carries its default
    /// decision flag.
    fn read_catalogs(&self, installer_dir: &Path) -> Result<InstallerCatalogs>;
}

/// Applies final decisions to the installer.
pub trait InstallerMutator {
    /// Perform every modification of the installer in `installer_dir`
    /// implied by the flags.
    fn modify(&self, installer_dir: &Path, catalogs: &InstallerCatalogs) -> Result<()>;
}

/// Read access to text files.
pub trait FileSystem {
    /// All lines of the file at `path`, without line terminators.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>>;
}

/// [`FileSystem`] backed by the real disk
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, and
    /// a leading byte order mark is dropped.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read {:?}", path))
            .map_err(|e| SlimmerError::selection(format!("{:#}", e)))?;

        let content = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = content {
            tracing::warn!(
                path = %path.display(),
                "Selection file is not valid UTF-8, replacing bad bytes"
            );
        }
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(&*content);

        Ok(split_lines(content).into_iter().map(str::to_string).collect())
    }
}

/// JSON catalog hand-off file inside the installer directory, acting as
/// both collaborators.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogFile;

impl CatalogFile {
    /// Location of the hand-off file for an installer directory
    pub fn path_in(installer_dir: &Path) -> PathBuf {
        installer_dir.join(CATALOG_FILE_NAME)
    }

    /// Load catalogs from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<InstallerCatalogs> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {:?}", path))?;

        let catalogs: InstallerCatalogs =
            serde_json::from_str(&content).context("Failed to parse catalog JSON")?;

        Ok(catalogs)
    }

    /// Save catalogs to a JSON file
    pub fn save(path: &Path, catalogs: &InstallerCatalogs) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(catalogs)
            .context("Failed to serialize catalogs to JSON")?;

        fs::write(path, json)
            .with_context(|| format!("Failed to write catalog to {:?}", path))?;

        Ok(())
    }
}

impl CatalogReader for CatalogFile {
    fn read_catalogs(&self, installer_dir: &Path) -> Result<InstallerCatalogs> {
        let path = Self::path_in(installer_dir);
        let catalogs =
            Self::load(&path).map_err(|e| SlimmerError::catalog(format!("{:#}", e)))?;
        tracing::debug!(
            path = %path.display(),
            entries = catalogs.len(),
            "Catalogs loaded"
        );
        Ok(catalogs)
    }
}

impl InstallerMutator for CatalogFile {
    /// Writes the flagged catalogs back over the hand-off file.
    fn modify(&self, installer_dir: &Path, catalogs: &InstallerCatalogs) -> Result<()> {
        let path = Self::path_in(installer_dir);
        Self::save(&path, catalogs).map_err(|e| SlimmerError::mutation(format!("{:#}", e)))?;
        tracing::debug!(path = %path.display(), "Flagged catalogs written");
        Ok(())
    }
}
