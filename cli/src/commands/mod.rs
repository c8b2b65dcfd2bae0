pub mod cli;
pub mod exec;
pub mod plan;

use std::path::PathBuf;

use wsrun_core::api::{find_root, load_from_root, AppConfig, CliError, ExecConfig};

/// Resolve the workspace root and its config for `args`.
///
/// Argument errors are reported before the filesystem is touched, so a
/// missing `exec` command is a usage error even outside a workspace.
pub fn prepare(args: &cli::Args) -> Result<(PathBuf, AppConfig), CliError> {
    if let cli::Commands::Exec(exec) = &args.command {
        exec.to_request(&ExecConfig::default()).validate()?;
    }

    let start = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let root = find_root(&start)?;
    let cfg = load_from_root(&root).map_err(|e| CliError::Config(format!("{e:#}")))?;
    Ok((root, cfg))
}

pub fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1..: first failing package's exit code
    // 11: config error
    // 12: workspace error
    // 13: dependency cycle
    // 20: IO error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Workspace(_) => 12,
        CliError::Executor(ee) => ee.exit_code(),
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}
