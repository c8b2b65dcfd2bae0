use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::WorkspaceError;

pub const MANIFEST_FILE_NAME: &str = "package.json";

/// The subset of `package.json` the runner cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: String,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    pub fn read(path: &Path) -> Result<Self, WorkspaceError> {
        let s = std::fs::read_to_string(path).map_err(|source| WorkspaceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&s).map_err(|source| WorkspaceError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every declared dependency name, de-duplicated and sorted.
    pub fn dependency_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .chain(self.optional_dependencies.keys())
            .collect();
        names.into_iter().cloned().collect()
    }
}
