//! Installer artifact catalogs.
//!
//! The catalogs are produced by the installer-reading collaborator. This crate
//! only reads each entry's identifying name and writes its decision flag;
//! entries are never added, removed or reordered. Every other attribute the
//! reader recorded rides along untouched in `attributes`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_flag() -> bool {
    true
}

/// A package in the installer manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageEntry {
    pub product_name: String,
    #[serde(default = "default_flag")]
    pub keep: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PackageEntry {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            keep: default_flag(),
            attributes: Map::new(),
        }
    }
}

/// A scheduled task the installer registers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTaskEntry {
    pub description: String,
    #[serde(default = "default_flag")]
    pub enabled: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ScheduledTaskEntry {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            enabled: default_flag(),
            attributes: Map::new(),
        }
    }
}

/// A component of the display driver package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayComponentEntry {
    pub description: String,
    #[serde(default = "default_flag")]
    pub keep: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl DisplayComponentEntry {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            keep: default_flag(),
            attributes: Map::new(),
        }
    }
}

/// The three catalogs read from one extracted installer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerCatalogs {
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
    #[serde(default)]
    pub scheduled_tasks: Vec<ScheduledTaskEntry>,
    #[serde(default)]
    pub display_components: Vec<DisplayComponentEntry>,
}

impl InstallerCatalogs {
    /// Total number of entries across all three kinds.
    pub fn len(&self) -> usize {
        self.packages.len() + self.scheduled_tasks.len() + self.display_components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
