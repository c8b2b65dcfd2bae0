#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wsrun_core::api::{
    CommandSpec, EnvSnapshot, ExecOptions, ExecutionEngine, ExitDetail, OutputRendererPlugin,
    ProcessAdapter, ProcessOutcome, RenderEvent, Unit,
};

/// One observed adapter call.
#[derive(Debug, Clone)]
pub struct Call {
    pub unit: String,
    pub program: String,
    pub cwd: PathBuf,
    pub envs: HashMap<OsString, OsString>,
    pub stream: bool,
    pub reject: bool,
}

/// Adapter that never spawns anything: it sleeps, records the call and
/// returns a scripted outcome.
#[derive(Default)]
pub struct MockAdapter {
    failures: HashMap<String, ExitDetail>,
    delay: Duration,
    calls: Mutex<Vec<Call>>,
    timeline: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, unit: &str, detail: ExitDetail) -> Self {
        self.failures.insert(unit.to_string(), detail);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.unit).collect()
    }

    /// `start:<unit>` / `end:<unit>` markers in the order they happened.
    pub fn timeline(&self) -> Vec<String> {
        self.timeline.lock().unwrap().clone()
    }

    pub fn position(&self, marker: &str) -> Option<usize> {
        self.timeline().iter().position(|m| m == marker)
    }
}

#[async_trait]
impl ProcessAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, command: &CommandSpec, opts: &ExecOptions) -> ProcessOutcome {
        let unit = opts.prefix.clone();
        self.calls.lock().unwrap().push(Call {
            unit: unit.clone(),
            program: command.program.clone(),
            cwd: opts.cwd.clone(),
            envs: opts.envs.clone(),
            stream: opts.stream,
            reject: opts.reject,
        });
        self.timeline.lock().unwrap().push(format!("start:{unit}"));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.timeline.lock().unwrap().push(format!("end:{unit}"));
        let stdout = if opts.stream {
            String::new()
        } else {
            format!("output of {unit}\n")
        };
        ProcessOutcome {
            failure: self.failures.get(&unit).cloned(),
            duration_ms: self.delay.as_millis() as u64,
            stdout,
            stderr: String::new(),
        }
    }
}

/// Renderer that keeps every event it sees.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Compact event names, e.g. `batch_start:0` or `unit_end:a`.
    pub fn kinds(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|ev| match ev {
                RenderEvent::RunStart { .. } => "run_start".to_string(),
                RenderEvent::Plan { .. } => "plan".to_string(),
                RenderEvent::BatchStart { batch_id, .. } => format!("batch_start:{batch_id}"),
                RenderEvent::UnitStart { unit, .. } => format!("unit_start:{unit}"),
                RenderEvent::UnitEnd { record, .. } => format!("unit_end:{}", record.unit),
                RenderEvent::BatchEnd { batch_id, .. } => format!("batch_end:{batch_id}"),
                RenderEvent::RunEnd { .. } => "run_end".to_string(),
            })
            .collect()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "memory"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn unit(name: &str, deps: &[&str]) -> Unit {
    Unit::new(name, format!("/ws/packages/{name}")).with_dependencies(deps.iter().copied())
}

pub fn engine(adapter: Arc<MockAdapter>) -> ExecutionEngine {
    ExecutionEngine::builder(adapter)
        .env(EnvSnapshot::from_vars([("PATH", "/usr/bin")]))
        .build()
}

pub fn engine_with_renderer(
    adapter: Arc<MockAdapter>,
    renderer: Arc<RecordingRenderer>,
) -> ExecutionEngine {
    ExecutionEngine::builder(adapter)
        .env(EnvSnapshot::from_vars([("PATH", "/usr/bin")]))
        .renderer(renderer)
        .build()
}
