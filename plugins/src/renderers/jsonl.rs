use std::io::Write as _;

use chrono::Local;
use serde_json::{json, Value};
use wsrun_core::api::{OutputRendererPlugin, RenderEvent};

/// Machine-oriented renderer: one JSON object per line per event.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                command,
                mode,
                total_units,
                total_batches,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "command": command,
                    "mode": mode,
                    "total_units": total_units,
                    "total_batches": total_batches,
                }
            }),
            RenderEvent::Plan {
                run_id,
                batches,
                broken_cycles,
            } => json!({
                "v": 1,
                "event_type": "executor.plan",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "batches": batches,
                    "broken_cycles": broken_cycles,
                    "total_units": batches.iter().map(Vec::len).sum::<usize>(),
                }
            }),
            RenderEvent::BatchStart {
                run_id,
                batch_id,
                units,
            } => json!({
                "v": 1,
                "event_type": "batch.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "batch_id": batch_id,
                    "units": units,
                }
            }),
            RenderEvent::UnitStart {
                run_id,
                unit,
                batch_id,
            } => json!({
                "v": 1,
                "event_type": "unit.start",
                "ts": ts,
                "run_id": run_id,
                "unit": unit,
                "metadata": {
                    "batch_id": batch_id,
                }
            }),
            RenderEvent::UnitEnd {
                run_id,
                batch_id,
                record,
            } => json!({
                "v": 1,
                "event_type": "unit.end",
                "ts": ts,
                "run_id": run_id,
                "unit": record.unit,
                "code": record.failure().map(|f| f.detail.exit_code()).unwrap_or(0),
                "metadata": {
                    "batch_id": batch_id,
                    "success": record.is_success(),
                    "record": serde_json::to_value(record).unwrap_or(Value::Null),
                }
            }),
            RenderEvent::BatchEnd { run_id, batch_id } => json!({
                "v": 1,
                "event_type": "batch.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "batch_id": batch_id,
                }
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_units": report.records.len(),
                    "succeeded": report.succeeded(),
                    "failed": report.failed(),
                    "not_attempted": report.not_attempted(),
                    "duration_ms": report.duration_ms,
                    "failures": report.failures().collect::<Vec<_>>(),
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
        .unwrap_or_else(|_| "{}".into());

        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}
