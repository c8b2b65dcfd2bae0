#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{CliError, WorkspaceError};
pub use executor::ExecutorError;
