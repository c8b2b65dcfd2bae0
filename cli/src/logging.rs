use std::path::{Path, PathBuf};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use wsrun_core::api::LoggingConfig;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

/// `RUST_LOG`, when set, wins over the configured level.
fn build_filter(level: &str) -> Result<EnvFilter, String> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(level).map_err(|e| format!("invalid log level {level:?}: {e}")),
    }
}

/// Log file for a run against `root`: `<dir>/wsrun.<workspace>.<pid>.log`.
fn log_file_path(logging: &LoggingConfig, root: &Path) -> PathBuf {
    let dir = match logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(d) => PathBuf::from(d),
        None => std::env::temp_dir().join("wsrun"),
    };

    let workspace: String = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let workspace = if workspace.is_empty() { "root".to_string() } else { workspace };

    dir.join(format!("wsrun.{workspace}.{}.log", std::process::id()))
}

/// Install the global subscriber for a run against the workspace at `root`.
pub fn init_tracing(logging: &LoggingConfig, root: &Path) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err("logging disabled for both console and file".to_string());
    }

    let filter = build_filter(&logging.level)?;

    let file_writer = if logging.file {
        let path = log_file_path(logging, root);
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(format!("bad log file path {}", path.display()));
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("create log dir {} failed: {e}", dir.display()))?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        let _ = LOG_GUARD.set(guard);
        Some(writer)
    } else {
        None
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });
    let file_layer = file_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| e.to_string())
}
