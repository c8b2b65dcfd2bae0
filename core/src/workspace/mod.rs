//! Workspace discovery: locate the root, read package manifests, select units.

mod discover;
mod filter;
mod manifest;

use std::path::{Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::error::WorkspaceError;
use crate::executor::types::Unit;

pub use discover::{discover_units, find_root};
pub use filter::UnitFilter;
pub use manifest::{PackageManifest, MANIFEST_FILE_NAME};

/// A discovered workspace: its root and every member package.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub units: Vec<Unit>,
}

impl Workspace {
    pub fn discover(root: &Path, cfg: &WorkspaceConfig) -> Result<Self, WorkspaceError> {
        Ok(Self {
            root: root.to_path_buf(),
            units: discover_units(root, cfg)?,
        })
    }

    pub fn select(&self, filter: &UnitFilter) -> Vec<Unit> {
        filter.apply(&self.units)
    }
}
