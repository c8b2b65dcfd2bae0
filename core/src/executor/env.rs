use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use super::types::Unit;

/// Name of the unit the command runs in.
pub const PACKAGE_NAME_VAR: &str = "WSRUN_PACKAGE_NAME";

/// Absolute path of the workspace root.
pub const ROOT_PATH_VAR: &str = "WSRUN_ROOT_PATH";

/// Ambient environment captured once per run.
///
/// Each unit gets its own copy with the injected variables added; the
/// process-wide environment is never modified.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    base: HashMap<OsString, OsString>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            base: std::env::vars_os().collect(),
        }
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            base: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Environment for one unit's command.
    pub fn for_unit(&self, unit: &Unit, root: &Path) -> HashMap<OsString, OsString> {
        let mut envs = self.base.clone();
        envs.insert(PACKAGE_NAME_VAR.into(), unit.name.clone().into());
        envs.insert(ROOT_PATH_VAR.into(), root.as_os_str().to_os_string());
        envs
    }
}
