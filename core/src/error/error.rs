use std::path::PathBuf;

use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("no wsrun.toml found in {} or any parent directory", .0.display())]
    RootNotFound(PathBuf),
    #[error("invalid package pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(
        "duplicate package name '{name}' ({} and {})",
        first.display(),
        second.display()
    )]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}
