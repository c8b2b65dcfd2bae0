use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::{WorkspaceConfig, CONFIG_FILE_NAME};
use crate::error::WorkspaceError;
use crate::executor::types::Unit;

use super::manifest::{PackageManifest, MANIFEST_FILE_NAME};

/// Nearest directory, starting at `start`, that holds a `wsrun.toml`.
pub fn find_root(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let start = std::fs::canonicalize(start).map_err(|source| WorkspaceError::Read {
        path: start.to_path_buf(),
        source,
    })?;

    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
        .ok_or(WorkspaceError::RootNotFound(start))
}

/// Package directories matched by the configured patterns, in path order.
fn package_dirs(root: &Path, cfg: &WorkspaceConfig) -> Result<BTreeSet<PathBuf>, WorkspaceError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut dirs = BTreeSet::new();

    for pattern in &cfg.packages {
        let full = format!("{}/{}", escaped_root, pattern.trim_end_matches('/'));
        let paths = glob::glob(&full).map_err(|e| WorkspaceError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        for entry in paths {
            let path = entry.map_err(|e| WorkspaceError::Read {
                path: e.path().to_path_buf(),
                source: std::io::Error::from(e),
            })?;
            if path.join(MANIFEST_FILE_NAME).is_file() {
                dirs.insert(path);
            } else {
                tracing::debug!(path = %path.display(), "skipping directory without package.json");
            }
        }
    }

    Ok(dirs)
}

/// Read every matched package into a unit, sorted by name.
pub fn discover_units(root: &Path, cfg: &WorkspaceConfig) -> Result<Vec<Unit>, WorkspaceError> {
    let mut by_name: BTreeMap<String, Unit> = BTreeMap::new();

    for dir in package_dirs(root, cfg)? {
        let manifest = PackageManifest::read(&dir.join(MANIFEST_FILE_NAME))?;
        if let Some(existing) = by_name.get(&manifest.name) {
            return Err(WorkspaceError::DuplicateName {
                name: manifest.name,
                first: existing.location.clone(),
                second: dir,
            });
        }

        let unit = Unit::new(manifest.name.clone(), dir)
            .with_dependencies(manifest.dependency_names())
            .with_private(manifest.private);
        by_name.insert(manifest.name, unit);
    }

    tracing::debug!(root = %root.display(), units = by_name.len(), "discovered packages");
    Ok(by_name.into_values().collect())
}
