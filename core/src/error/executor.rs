use thiserror::Error;

use crate::executor::types::{RunReport, UnitFailure};

/// Executor-specific errors for batching and running units
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("duplicate package name: {0}")]
    DuplicateUnit(String),

    #[error("circular dependency detected: {cycle}")]
    CyclicDependency { cycle: String },

    #[error("{failed} package(s) failed, first failure: {first}")]
    AggregateFailure {
        first: UnitFailure,
        failed: usize,
        report: Box<RunReport>,
    },
}

impl ExecutorError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 11,
            Self::DuplicateUnit(_) => 12,
            Self::CyclicDependency { .. } => 13,
            Self::AggregateFailure { first, .. } => first.detail.exit_code(),
        }
    }
}
