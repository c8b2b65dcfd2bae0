use std::fmt::Write as _;
use std::io::Write as _;

use wsrun_core::api::{OutputRendererPlugin, RenderEvent, RunMode, UnitOutcome, UnitRecord};

/// Human-oriented renderer: one block per settled unit and a closing summary.
pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn marks(&self) -> (&'static str, &'static str) {
        if self.ascii_only {
            ("[ok]", "[FAIL]")
        } else {
            ("✔", "✘")
        }
    }

    /// Text written to stdout for `event`, if any.
    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        match event {
            RenderEvent::RunStart {
                command,
                mode,
                total_units,
                total_batches,
                ..
            } => Some(match mode {
                RunMode::Batched => format!(
                    "wsrun: `{command}` in {total_units} package(s), {total_batches} batch(es)\n"
                ),
                RunMode::Parallel => {
                    format!("wsrun: `{command}` in {total_units} package(s), all at once\n")
                }
            }),
            RenderEvent::Plan { broken_cycles, .. } if !broken_cycles.is_empty() => {
                let mut out = String::new();
                for cycle in broken_cycles {
                    let _ = writeln!(out, "warning: dependency cycle broken: {}", cycle.join(" -> "));
                }
                Some(out)
            }
            RenderEvent::UnitEnd { record, .. } => Some(self.format_record(record)),
            RenderEvent::RunEnd { report, .. } => {
                let mut out = format!(
                    "\n{} succeeded, {} failed, {} not attempted ({}ms)\n",
                    report.succeeded(),
                    report.failed(),
                    report.not_attempted(),
                    report.duration_ms
                );
                let failed: Vec<&str> = report.failures().map(|f| f.unit.as_str()).collect();
                if !failed.is_empty() {
                    let _ = writeln!(out, "failed: {}", failed.join(", "));
                }
                Some(out)
            }
            _ => None,
        }
    }

    fn format_record(&self, record: &UnitRecord) -> String {
        let (ok, fail) = self.marks();
        let mut out = match &record.outcome {
            UnitOutcome::Succeeded => format!("{ok} {} ({}ms)\n", record.unit, record.duration_ms),
            UnitOutcome::Failed(failure) => {
                format!("{fail} {failure} ({}ms)\n", record.duration_ms)
            }
            UnitOutcome::NotAttempted => format!("- {} not attempted\n", record.unit),
        };
        push_block(&mut out, &record.stdout);
        out
    }
}

fn push_block(out: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(text) = self.format_event(event) {
            let mut out = std::io::stdout().lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.flush();
        }

        if let RenderEvent::UnitEnd { record, .. } = event {
            let mut err_block = String::new();
            push_block(&mut err_block, &record.stderr);
            if !err_block.is_empty() {
                let mut err = std::io::stderr().lock();
                let _ = err.write_all(err_block.as_bytes());
                let _ = err.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsrun_core::api::{ExitDetail, RunReport, Unit, UnitFailure};

    fn failed_record() -> UnitRecord {
        UnitRecord::failed(
            UnitFailure {
                unit: "pkg-b".to_string(),
                command: "npm test".to_string(),
                detail: ExitDetail::Code(2),
                rejected: true,
            },
            7,
        )
    }

    #[test]
    fn unit_block_includes_buffered_stdout() {
        let renderer = TextRendererPlugin::new(true);
        let record = UnitRecord::succeeded(&Unit::new("pkg-a", "/ws/a"), 12)
            .with_output("built\nok".to_string(), String::new());

        let text = renderer
            .format_event(&RenderEvent::UnitEnd {
                run_id: "run".to_string(),
                batch_id: 0,
                record,
            })
            .unwrap();
        assert_eq!(text, "[ok] pkg-a (12ms)\nbuilt\nok\n");
    }

    #[test]
    fn failure_line_names_command_and_exit() {
        let renderer = TextRendererPlugin::new(true);
        let text = renderer
            .format_event(&RenderEvent::UnitEnd {
                run_id: "run".to_string(),
                batch_id: 1,
                record: failed_record(),
            })
            .unwrap();
        assert_eq!(text, "[FAIL] pkg-b: `npm test` exited with code 2 (7ms)\n");
    }

    #[test]
    fn summary_lists_failed_units() {
        let renderer = TextRendererPlugin::new(false);
        let report = RunReport {
            mode: RunMode::Batched,
            batches: vec![vec!["pkg-a".into(), "pkg-b".into()], vec!["pkg-c".into()]],
            broken_cycles: Vec::new(),
            records: vec![
                UnitRecord::succeeded(&Unit::new("pkg-a", "/ws/a"), 1),
                failed_record(),
                UnitRecord::not_attempted(&Unit::new("pkg-c", "/ws/c")),
            ],
            duration_ms: 30,
        };

        let text = renderer
            .format_event(&RenderEvent::RunEnd {
                run_id: "run".to_string(),
                report,
            })
            .unwrap();
        assert!(text.contains("1 succeeded, 1 failed, 1 not attempted (30ms)"));
        assert!(text.contains("failed: pkg-b"));
    }

    #[test]
    fn broken_cycles_are_warned_about() {
        let renderer = TextRendererPlugin::new(true);
        let text = renderer
            .format_event(&RenderEvent::Plan {
                run_id: "run".to_string(),
                batches: vec![vec!["a".into(), "b".into()]],
                broken_cycles: vec![vec!["a".into(), "b".into(), "a".into()]],
            })
            .unwrap();
        assert_eq!(text, "warning: dependency cycle broken: a -> b -> a\n");
    }

    #[test]
    fn quiet_events_render_nothing() {
        let renderer = TextRendererPlugin::new(true);
        assert!(renderer
            .format_event(&RenderEvent::BatchEnd {
                run_id: "run".to_string(),
                batch_id: 0,
            })
            .is_none());
        assert!(renderer
            .format_event(&RenderEvent::Plan {
                run_id: "run".to_string(),
                batches: Vec::new(),
                broken_cycles: Vec::new(),
            })
            .is_none());
    }
}
