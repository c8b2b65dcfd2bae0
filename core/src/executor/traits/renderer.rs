use crate::executor::types::{RunMode, RunReport, UnitRecord};

/// Output renderer plugin (controls what the user sees)
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Run lifecycle events
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        command: String,
        mode: RunMode,
        total_units: usize,
        total_batches: usize,
    },
    Plan {
        run_id: String,
        batches: Vec<Vec<String>>,
        broken_cycles: Vec<Vec<String>>,
    },
    BatchStart {
        run_id: String,
        batch_id: usize,
        units: Vec<String>,
    },
    UnitStart {
        run_id: String,
        unit: String,
        batch_id: usize,
    },
    UnitEnd {
        run_id: String,
        batch_id: usize,
        record: UnitRecord,
    },
    BatchEnd {
        run_id: String,
        batch_id: usize,
    },
    RunEnd {
        run_id: String,
        report: RunReport,
    },
}
