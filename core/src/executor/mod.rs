//! Dependency-aware batch execution across workspace units.
//!
//! # Architecture
//!
//! ```text
//! Vec<Unit> + ExecRequest
//!   ↓
//! plan_batches() → UnitGraph::batches() (Kahn layering, cycle detection)
//!   ↓
//! BatchPlan { batches, broken_cycles }
//!   ↓
//! run_batches()       one batch at a time, bounded concurrency inside a batch
//! run_all_parallel()  every unit at once, no ordering
//!   ↓
//! ProcessAdapter::execute() per unit → UnitRecord
//!   ↓
//! RunReport → into_verdict()
//! ```

mod engine;
mod env;
mod graph;
mod parallel;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{plan_batches, ExecutionEngine, ExecutionEngineBuilder};
pub use env::{EnvSnapshot, PACKAGE_NAME_VAR, ROOT_PATH_VAR};
pub use graph::{compute_batches, single_batch, BatchPlan, UnitGraph};
pub use parallel::run_all_parallel;
pub use scheduler::{run_batches, BatchObserver, HaltFlag, NoopObserver};
pub use types::{ExecRequest, RunMode, RunReport, Unit, UnitOutcome, UnitRecord};
