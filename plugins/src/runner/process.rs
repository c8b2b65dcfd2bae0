use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::task::JoinHandle;

use wsrun_core::api::{CommandSpec, ExecOptions, ExitDetail, ProcessAdapter, ProcessOutcome};
use wsrun_core::util::RingBytes;

use super::io_pump::{pump_capture, pump_prefixed};

/// Runs unit commands as child processes.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessAdapter for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn execute(&self, command: &CommandSpec, opts: &ExecOptions) -> ProcessOutcome {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        if !opts.cwd.is_dir() {
            return ProcessOutcome::spawn_failed(
                format!("working directory {} does not exist", opts.cwd.display()),
                elapsed_ms(),
            );
        }

        let spawned = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&opts.cwd)
            .env_clear()
            .envs(&opts.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program = %command.program, error = %e, "spawn failed");
                return ProcessOutcome::spawn_failed(spawn_message(&command.program, &e), elapsed_ms());
            }
        };

        let mut output = OutputPumps::default();
        if opts.stream {
            if let Some(rd) = child.stdout.take() {
                output.stdout = Some(pump_prefixed(rd, opts.prefix.clone(), "stdout", |line| {
                    let mut out = std::io::stdout().lock();
                    out.write_all(line)?;
                    out.flush()
                }));
            }
            if let Some(rd) = child.stderr.take() {
                output.stderr = Some(pump_prefixed(rd, opts.prefix.clone(), "stderr", |line| {
                    let mut err = std::io::stderr().lock();
                    err.write_all(line)?;
                    err.flush()
                }));
            }
        } else {
            let stdout_ring = RingBytes::new(opts.capture_bytes);
            let stderr_ring = RingBytes::new(opts.capture_bytes);
            if let Some(rd) = child.stdout.take() {
                output.stdout = Some(pump_capture(rd, stdout_ring.clone(), "stdout"));
            }
            if let Some(rd) = child.stderr.take() {
                output.stderr = Some(pump_capture(rd, stderr_ring.clone(), "stderr"));
            }
            output.rings = Some((stdout_ring, stderr_ring));
        }

        let failure = match child.wait().await {
            Ok(status) => classify(status),
            Err(e) => Some(ExitDetail::Internal(format!("failed to wait for child: {e}"))),
        };

        let (stdout, stderr) = output.drain(&opts.prefix).await;
        ProcessOutcome {
            failure,
            duration_ms: elapsed_ms(),
            stdout,
            stderr,
        }
    }
}

#[derive(Default)]
struct OutputPumps {
    stdout: Option<JoinHandle<anyhow::Result<u64>>>,
    stderr: Option<JoinHandle<anyhow::Result<u64>>>,
    rings: Option<(RingBytes, RingBytes)>,
}

impl OutputPumps {
    /// Wait for both pumps to hit EOF, then hand back whatever was buffered.
    async fn drain(self, unit: &str) -> (String, String) {
        for (label, handle) in [("stdout", self.stdout), ("stderr", self.stderr)] {
            let Some(handle) = handle else { continue };
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(unit, stream = label, "output pump failed: {e:#}"),
                Err(e) => tracing::warn!(unit, stream = label, "output pump aborted: {e}"),
            }
        }

        match self.rings {
            Some((out, err)) => (out.to_string_lossy(), err.to_string_lossy()),
            None => (String::new(), String::new()),
        }
    }
}

fn spawn_message(program: &str, e: &std::io::Error) -> String {
    match e.kind() {
        std::io::ErrorKind::NotFound => format!("command not found: {program}"),
        std::io::ErrorKind::PermissionDenied => format!("permission denied: {program}"),
        _ => format!("{program}: {e}"),
    }
}

fn classify(status: ExitStatus) -> Option<ExitDetail> {
    if status.success() {
        return None;
    }
    if let Some(code) = status.code() {
        return Some(ExitDetail::Code(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return Some(ExitDetail::Signal(sig));
        }
    }

    Some(ExitDetail::Internal(format!("process ended abnormally: {status}")))
}
