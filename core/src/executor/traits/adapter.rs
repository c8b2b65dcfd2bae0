use async_trait::async_trait;

use crate::executor::types::{CommandSpec, ExecOptions, ProcessOutcome};

/// Boundary to the operating system: spawns one unit's command.
///
/// Implementations classify the exit (`ProcessOutcome::failure`) and never
/// return an error: a spawn failure is itself an outcome. The returned future
/// resolves once the process has exited and its output has been drained.
#[async_trait]
pub trait ProcessAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, command: &CommandSpec, opts: &ExecOptions) -> ProcessOutcome;
}
