use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::ExecConfig;
use crate::error::ExecutorError;

/// Caller-facing knobs for one `exec` invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Command and its arguments (`argv[0]` is the program)
    pub command: Vec<String>,

    /// Stop launching new units after the first failure
    pub bail: bool,

    /// Stream output live, prefixed by unit name, instead of buffering it
    pub stream: bool,

    /// Launch every unit at once, ignoring dependency order
    pub parallel: bool,

    /// Fail instead of breaking dependency cycles
    pub reject_cycles: bool,

    /// Order batches topologically. When false every unit lands in one batch.
    pub sort: bool,

    /// Run the command through the platform shell
    pub shell: bool,

    /// Maximum units in flight per batch (0 = unbounded)
    pub concurrency: usize,

    /// Bytes of buffered output kept per stream
    pub capture_bytes: usize,
}

impl Default for ExecRequest {
    fn default() -> Self {
        Self::from_config(&ExecConfig::default(), Vec::new())
    }
}

impl ExecRequest {
    pub fn from_config(cfg: &ExecConfig, command: Vec<String>) -> Self {
        Self {
            command,
            bail: cfg.bail,
            stream: cfg.stream,
            parallel: false,
            reject_cycles: cfg.reject_cycles,
            sort: cfg.sort,
            shell: cfg.shell,
            concurrency: cfg.effective_concurrency(),
            capture_bytes: cfg.capture_bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ExecutorError> {
        match self.command.first() {
            None => Err(ExecutorError::Configuration(
                "a command to run is required".to_string(),
            )),
            Some(program) if program.trim().is_empty() => Err(ExecutorError::Configuration(
                "command must not be empty".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Unlimited-parallel runs always stream.
    pub fn effective_stream(&self) -> bool {
        self.stream || self.parallel
    }

    pub fn mode(&self) -> RunMode {
        if self.parallel {
            RunMode::Parallel
        } else {
            RunMode::Batched
        }
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::from_argv(&self.command, self.shell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Batched,
    Parallel,
}

/// Program plus arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    display: String,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        let display = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            program,
            args,
            display,
        }
    }

    pub fn from_argv(argv: &[String], shell: bool) -> Self {
        let Some((program, args)) = argv.split_first() else {
            return Self::new(String::new(), Vec::new());
        };

        if !shell {
            return Self::new(program.clone(), args.to_vec());
        }

        let script = argv.join(" ");
        let (sh, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        Self {
            program: sh.to_string(),
            args: vec![flag.to_string(), script.clone()],
            display: script,
        }
    }

    /// Human-readable command line
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Per-unit spawn options handed to the process adapter.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub cwd: PathBuf,

    /// Complete environment of the child (the child does not inherit)
    pub envs: HashMap<OsString, OsString>,

    /// Stream lines live instead of buffering them
    pub stream: bool,

    /// Prefix for streamed lines
    pub prefix: String,

    /// Treat a failure as fatal for the rest of the run
    pub reject: bool,

    pub capture_bytes: usize,
}
