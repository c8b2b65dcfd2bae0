use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub exec: ExecConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Glob patterns, relative to the workspace root, matching package directories.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
}

fn default_packages() -> Vec<String> {
    vec!["packages/*".to_string()]
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            packages: default_packages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Units in flight per batch. Unset means one per CPU; 0 means unbounded.
    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default = "default_bail")]
    pub bail: bool,

    #[serde(default)]
    pub stream: bool,

    #[serde(default)]
    pub reject_cycles: bool,

    #[serde(default = "default_sort")]
    pub sort: bool,

    #[serde(default)]
    pub shell: bool,

    /// Tail kept per stream when output is buffered.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,
}

fn default_bail() -> bool {
    true
}

fn default_sort() -> bool {
    true
}

fn default_capture_bytes() -> usize {
    1024 * 1024
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            bail: default_bail(),
            stream: false,
            reject_cycles: false,
            sort: default_sort(),
            shell: false,
            capture_bytes: default_capture_bytes(),
        }
    }
}

impl ExecConfig {
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "wsrun_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}
