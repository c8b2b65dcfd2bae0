use std::fmt::Write as _;
use std::path::Path;

use serde_json::{json, Value};
use wsrun_core::api::{plan_batches, AppConfig, BatchPlan, CliError, Workspace};

use super::cli::{OutputFormat, PlanArgs};

/// `wsrun plan`: print the batches `exec` would run, without running them.
pub fn run_plan(
    root: &Path,
    cfg: &AppConfig,
    output: OutputFormat,
    args: PlanArgs,
) -> Result<i32, CliError> {
    let workspace = Workspace::discover(root, &cfg.workspace)?;
    let units = workspace.select(&args.filter.to_filter()?);
    let plan = plan_batches(
        &units,
        cfg.exec.sort && !args.no_sort,
        cfg.exec.reject_cycles || args.reject_cycles,
    )?;

    match output {
        OutputFormat::Text => print!("{}", format_plan_text(&plan)),
        OutputFormat::Jsonl => println!("{}", plan_to_json(&plan)),
    }
    Ok(0)
}

pub fn format_plan_text(plan: &BatchPlan) -> String {
    let mut out = String::new();
    if plan.is_empty() {
        out.push_str("no packages selected\n");
        return out;
    }
    for cycle in &plan.broken_cycles {
        let _ = writeln!(out, "warning: dependency cycle broken: {}", cycle.join(" -> "));
    }
    for (idx, names) in plan.names().iter().enumerate() {
        let _ = writeln!(out, "batch {}: {}", idx + 1, names.join(", "));
    }
    out
}

pub fn plan_to_json(plan: &BatchPlan) -> Value {
    json!({
        "v": 1,
        "event_type": "executor.plan",
        "metadata": {
            "batches": plan.names(),
            "broken_cycles": plan.broken_cycles,
            "total_units": plan.unit_count(),
        }
    })
}
