use std::path::Path;

use wsrun_core::api::{AppConfig, CliError, ExecutionEngine, Workspace};
use wsrun_plugins::factory;

use super::cli::{ExecArgs, OutputFormat};

/// `wsrun exec`: returns the process exit code, or the error that decides it.
pub async fn run_exec(
    root: &Path,
    cfg: &AppConfig,
    output: OutputFormat,
    ascii: bool,
    args: ExecArgs,
) -> Result<i32, CliError> {
    let request = args.to_request(&cfg.exec);
    request.validate()?;

    let workspace = Workspace::discover(root, &cfg.workspace)?;
    let units = workspace.select(&args.filter.to_filter()?);
    tracing::info!(
        discovered = workspace.units.len(),
        selected = units.len(),
        "selected packages"
    );

    let engine = ExecutionEngine::builder(factory::build_runner())
        .renderer(factory::build_renderer(output.as_str(), ascii))
        .build();

    let report = engine.execute(root, &units, &request).await?;
    report.into_verdict()?;
    Ok(0)
}
