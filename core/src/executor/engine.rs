use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::ExecutorError;

use super::env::EnvSnapshot;
use super::graph::{compute_batches, single_batch, BatchPlan, UnitGraph};
use super::parallel::run_all_parallel;
use super::scheduler::{run_batches, BatchObserver};
use super::traits::{OutputRendererPlugin, ProcessAdapter, RenderEvent};
use super::types::{
    CommandSpec, ExecOptions, ExecRequest, RunMode, RunReport, Unit, UnitFailure, UnitRecord,
};

/// Execution engine for one `exec` invocation
pub struct ExecutionEngine {
    adapter: Arc<dyn ProcessAdapter>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    env: EnvSnapshot,
}

pub struct ExecutionEngineBuilder {
    adapter: Arc<dyn ProcessAdapter>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    env: Option<EnvSnapshot>,
}

impl ExecutionEngine {
    pub fn new(adapter: Arc<dyn ProcessAdapter>) -> Self {
        Self::builder(adapter).build()
    }

    pub fn builder(adapter: Arc<dyn ProcessAdapter>) -> ExecutionEngineBuilder {
        ExecutionEngineBuilder::new(adapter)
    }

    /// Run the request's command in every unit.
    ///
    /// Configuration, duplicate and cycle errors are returned before any unit
    /// starts. Unit failures never surface here: they are recorded in the
    /// report, and [`RunReport::into_verdict`] turns them into an error.
    #[tracing::instrument(name = "engine.execute", skip_all, fields(units = units.len()))]
    pub async fn execute(
        &self,
        root: &Path,
        units: &[Unit],
        request: &ExecRequest,
    ) -> Result<RunReport, ExecutorError> {
        request.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let command = request.command_spec();
        let mode = request.mode();
        let plan = match mode {
            RunMode::Parallel => None,
            RunMode::Batched => Some(plan_batches(units, request.sort, request.reject_cycles)?),
        };

        tracing::info!(
            run_id = %run_id,
            command = %command.display(),
            ?mode,
            units = units.len(),
            env_vars = self.env.len(),
            "starting run"
        );
        if self.env.is_empty() {
            tracing::warn!(run_id = %run_id, "ambient environment is empty; PATH lookups will fail");
        }
        if units.is_empty() {
            tracing::info!("no packages to run in");
        }

        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            command: command.display().to_string(),
            mode,
            total_units: units.len(),
            total_batches: plan.as_ref().map(BatchPlan::len).unwrap_or(0),
        });

        let ctx = Arc::new(UnitContext {
            run_id: run_id.clone(),
            root: root.to_path_buf(),
            command,
            env: self.env.clone(),
            stream: request.effective_stream(),
            reject: request.bail,
            capture_bytes: request.capture_bytes,
            adapter: self.adapter.clone(),
            renderer: self.renderer.clone(),
        });
        let action = move |batch_id: usize, unit: Unit| {
            let ctx = ctx.clone();
            async move { ctx.run_unit(batch_id, unit).await }
        };

        let report = match plan {
            Some(plan) => {
                self.emit(RenderEvent::Plan {
                    run_id: run_id.clone(),
                    batches: plan.names(),
                    broken_cycles: plan.broken_cycles.clone(),
                });
                let observer = RenderObserver {
                    run_id: run_id.clone(),
                    renderer: self.renderer.clone(),
                };
                run_batches(&plan, request.concurrency, &observer, action).await
            }
            None => run_all_parallel(units, action).await,
        };

        tracing::info!(
            run_id = %run_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            not_attempted = report.not_attempted(),
            duration_ms = report.duration_ms,
            "run finished"
        );

        self.emit(RenderEvent::RunEnd {
            run_id,
            report: report.clone(),
        });

        Ok(report)
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

impl ExecutionEngineBuilder {
    pub fn new(adapter: Arc<dyn ProcessAdapter>) -> Self {
        Self {
            adapter,
            renderer: None,
            env: None,
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Base environment for every unit (defaults to the current process env).
    pub fn env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    pub fn build(self) -> ExecutionEngine {
        ExecutionEngine {
            adapter: self.adapter,
            renderer: self.renderer,
            env: self.env.unwrap_or_else(EnvSnapshot::capture),
        }
    }
}

/// Batch plan for a batched run: topological when `sort`, otherwise one batch.
pub fn plan_batches(
    units: &[Unit],
    sort: bool,
    reject_cycles: bool,
) -> Result<BatchPlan, ExecutorError> {
    if sort {
        return compute_batches(units, reject_cycles);
    }
    UnitGraph::new(units)?;
    Ok(single_batch(units))
}

/// Everything a unit's action needs, shared by all units of a run.
struct UnitContext {
    run_id: String,
    root: PathBuf,
    command: CommandSpec,
    env: EnvSnapshot,
    stream: bool,
    reject: bool,
    capture_bytes: usize,
    adapter: Arc<dyn ProcessAdapter>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl UnitContext {
    async fn run_unit(&self, batch_id: usize, unit: Unit) -> UnitRecord {
        tracing::debug!(unit = %unit.name, batch_id, "starting unit");
        self.emit(RenderEvent::UnitStart {
            run_id: self.run_id.clone(),
            unit: unit.name.clone(),
            batch_id,
        });

        let opts = ExecOptions {
            cwd: unit.location.clone(),
            envs: self.env.for_unit(&unit, &self.root),
            stream: self.stream,
            prefix: unit.name.clone(),
            reject: self.reject,
            capture_bytes: self.capture_bytes,
        };
        let outcome = self.adapter.execute(&self.command, &opts).await;

        let record = match outcome.failure {
            None => {
                tracing::debug!(unit = %unit.name, duration_ms = outcome.duration_ms, "unit succeeded");
                UnitRecord::succeeded(&unit, outcome.duration_ms)
            }
            Some(detail) => {
                let failure = UnitFailure {
                    unit: unit.name.clone(),
                    command: self.command.display().to_string(),
                    detail,
                    rejected: self.reject,
                };
                tracing::error!(unit = %unit.name, "{failure}");
                UnitRecord::failed(failure, outcome.duration_ms)
            }
        }
        .with_output(outcome.stdout, outcome.stderr);

        self.emit(RenderEvent::UnitEnd {
            run_id: self.run_id.clone(),
            batch_id,
            record: record.clone(),
        });

        record
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

struct RenderObserver {
    run_id: String,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

impl BatchObserver for RenderObserver {
    fn batch_started(&self, batch_id: usize, units: &[Unit]) {
        tracing::info!(batch_id, units = units.len(), "batch started");
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::BatchStart {
                run_id: self.run_id.clone(),
                batch_id,
                units: units.iter().map(|u| u.name.clone()).collect(),
            });
        }
    }

    fn batch_finished(&self, batch_id: usize) {
        tracing::info!(batch_id, "batch finished");
        if let Some(renderer) = &self.renderer {
            renderer.render(&RenderEvent::BatchEnd {
                run_id: self.run_id.clone(),
                batch_id,
            });
        }
    }
}
