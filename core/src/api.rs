//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `wsrun_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_from_root, AppConfig, ExecConfig, LoggingConfig, WorkspaceConfig, CONFIG_FILE_NAME,
};
pub use crate::error::{CliError, ExecutorError, WorkspaceError};
pub use crate::executor::traits::{OutputRendererPlugin, ProcessAdapter, RenderEvent};
pub use crate::executor::types::{
    CommandSpec, ExecOptions, ExecRequest, ExitDetail, ProcessOutcome, RunMode, RunReport, Unit,
    UnitFailure, UnitOutcome, UnitRecord,
};
pub use crate::executor::{
    plan_batches, BatchPlan, EnvSnapshot, ExecutionEngine, PACKAGE_NAME_VAR, ROOT_PATH_VAR,
};
pub use crate::util::RingBytes;
pub use crate::workspace::{find_root, UnitFilter, Workspace};
