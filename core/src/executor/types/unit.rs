use std::path::PathBuf;

use serde::Serialize;

/// A workspace member the command runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    /// Unique package name
    pub name: String,

    /// Package directory, used as the working directory of its command
    pub location: PathBuf,

    /// Declared dependency names. Names that are not workspace members are
    /// treated as external and ignored when batching.
    pub dependencies: Vec<String>,

    /// Marked `"private": true` in its manifest
    pub private: bool,
}

impl Unit {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            dependencies: Vec::new(),
            private: false,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}
