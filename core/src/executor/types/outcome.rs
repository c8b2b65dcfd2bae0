use std::fmt;

use serde::Serialize;

use super::unit::Unit;

/// Why a unit's command did not succeed. Decided once by the process adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitDetail {
    /// Process exited with a non-zero status code
    Code(i32),
    /// Process was terminated by a signal
    Signal(i32),
    /// Process could not be started
    Spawn(String),
    /// The unit's task died before producing an outcome
    Internal(String),
}

impl ExitDetail {
    /// Exit code to propagate for this failure; never 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Code(code) if *code != 0 => *code,
            _ => 1,
        }
    }
}

impl fmt::Display for ExitDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exited with code {code}"),
            Self::Signal(sig) => write!(f, "killed by signal {sig}"),
            Self::Spawn(msg) => write!(f, "failed to spawn: {msg}"),
            Self::Internal(msg) => write!(f, "aborted: {msg}"),
        }
    }
}

/// A single unit's execution error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    /// Command line that was attempted
    pub command: String,
    pub detail: ExitDetail,
    /// Raised with `reject` semantics: the failure stops further launches.
    pub rejected: bool,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: `{}` {}", self.unit, self.command, self.detail)
    }
}

/// Terminal state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Succeeded,
    Failed(UnitFailure),
    /// Never started because an earlier failure halted the run
    NotAttempted,
}

/// Outcome of one unit plus what was observed while it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecord {
    pub unit: String,
    pub outcome: UnitOutcome,
    pub duration_ms: u64,

    /// Buffered stdout (empty when output was streamed)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    /// Buffered stderr (empty when output was streamed)
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl UnitRecord {
    pub fn succeeded(unit: &Unit, duration_ms: u64) -> Self {
        Self {
            unit: unit.name.clone(),
            outcome: UnitOutcome::Succeeded,
            duration_ms,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failed(failure: UnitFailure, duration_ms: u64) -> Self {
        Self {
            unit: failure.unit.clone(),
            outcome: UnitOutcome::Failed(failure),
            duration_ms,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn not_attempted(unit: &Unit) -> Self {
        Self {
            unit: unit.name.clone(),
            outcome: UnitOutcome::NotAttempted,
            duration_ms: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Succeeded)
    }

    pub fn failure(&self) -> Option<&UnitFailure> {
        match &self.outcome {
            UnitOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// A rejected failure stops every launch that has not happened yet.
    pub fn halts_run(&self) -> bool {
        self.failure().is_some_and(|f| f.rejected)
    }
}

/// What the process adapter observed for one command.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// `None` when the process exited with status 0
    pub failure: Option<ExitDetail>,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn spawn_failed(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            failure: Some(ExitDetail::Spawn(message.into())),
            duration_ms,
            ..Self::default()
        }
    }
}
