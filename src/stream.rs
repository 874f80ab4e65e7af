//! Child-process launch and lazy NDJSON record streaming.
//!
//! [`StreamRunner`] launches exactly one child per call with stdin, stdout,
//! and stderr captured. An optional input payload is written to stdin before
//! the channel is closed; stdout is consumed one line at a time, each line
//! decoded as a self-contained JSON document and yielded through
//! [`RecordStream`] in arrival order. The full output is never materialized.
//!
//! stderr is drained concurrently into a bounded tail, since an unread
//! stderr pipe can fill up and block the child.

use crate::command_spec::CommandSpec;
use crate::error::BridgeError;
use crate::platform::{TargetOs, adapt_command};
use crate::tail_buffer::TailBuffer;
use serde_json::Value;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;

/// How long a terminated child gets to exit after TERM before KILL.
#[cfg(unix)]
const TERM_GRACE: std::time::Duration = std::time::Duration::from_millis(500);

/// Buffering limits for captured child output.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Maximum bytes retained from the tail of the child's stderr
    /// (default: 2048).
    pub stderr_tail_cap_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            stderr_tail_cap_bytes: 2048,
        }
    }
}

/// Launches backend processes and bridges their NDJSON output.
#[derive(Debug, Clone, Default)]
pub struct StreamRunner {
    buffer_config: BufferConfig,
}

impl StreamRunner {
    /// Create a runner with default buffering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with custom buffering limits.
    #[must_use]
    pub const fn with_buffer_config(buffer_config: BufferConfig) -> Self {
        Self { buffer_config }
    }

    /// Launch `spec` and stream its stdout as decoded JSON records.
    ///
    /// If `input` is supplied it is written to the child's stdin and the
    /// channel is closed, signaling end-of-input; with no payload stdin is
    /// closed immediately. A spawn failure surfaces as
    /// [`BridgeError::Launch`] before any record is produced.
    ///
    /// The child cannot outlive the stream: dropping the returned
    /// [`RecordStream`] before exhaustion kills the process.
    pub async fn run(
        &self,
        spec: &CommandSpec,
        input: Option<&str>,
    ) -> Result<RecordStream, BridgeError> {
        let mut cmd = spec.to_command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Put the child in its own process group so terminate() can signal
        // the whole tree.
        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                libc::setpgid(0, 0);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| BridgeError::Launch {
            program: spec.program.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            target: "llm_bridge::stream",
            program = %spec.program.to_string_lossy(),
            pid = child.id(),
            "spawned backend process"
        );

        let stdout = child.stdout.take().ok_or_else(|| BridgeError::Io {
            reason: "failed to capture stdout".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| BridgeError::Io {
            reason: "failed to capture stderr".to_string(),
        })?;

        // Drain stderr from the start; it is not parsed, only retained as a
        // bounded tail for exit reporting.
        let cap = self.buffer_config.stderr_tail_cap_bytes;
        let stderr_task = tokio::spawn(async move {
            let mut tail = TailBuffer::new(cap);
            let mut buf = vec![0u8; 8192];
            loop {
                match stderr.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => tail.write(&buf[..n]),
                    Err(_) => break,
                }
            }
            tail
        });

        let mut stdin = child.stdin.take().ok_or_else(|| BridgeError::Io {
            reason: "failed to capture stdin".to_string(),
        })?;
        if let Some(payload) = input {
            stdin
                .write_all(payload.as_bytes())
                .await
                .map_err(|e| BridgeError::Io {
                    reason: format!("failed to write to child stdin: {e}"),
                })?;
        }
        drop(stdin); // Close stdin

        Ok(RecordStream {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_task: Some(stderr_task),
            status: None,
            fused: false,
        })
    }

    /// Adapt `command` for the target host, then launch it.
    ///
    /// This is the composed "execute adapted command" path: the vector goes
    /// through [`adapt_command`] first, so on a Windows target a `cmd.exe`
    /// built-in arrives at the launch already wrapped in the interpreter.
    ///
    /// # Errors
    ///
    /// [`BridgeError::EmptyCommand`] if `command` is empty: adaptation is
    /// total, but there is nothing to launch.
    pub async fn run_adapted(
        &self,
        target: TargetOs,
        command: &[String],
        input: Option<&str>,
    ) -> Result<RecordStream, BridgeError> {
        let adapted = adapt_command(target, command);
        let spec = CommandSpec::from_vector(&adapted).ok_or(BridgeError::EmptyCommand)?;
        self.run(&spec, input).await
    }
}

/// Lazily yields one decoded JSON record per line of child stdout.
///
/// Records arrive in line order. Pulling the next record suspends until the
/// child produces a complete line; that suspension is the stream's sole
/// blocking point. The stream ends when stdout closes.
pub struct RecordStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<TailBuffer>>,
    status: Option<ExitStatus>,
    fused: bool,
}

impl RecordStream {
    /// Pull the next decoded record.
    ///
    /// Returns `None` once stdout has closed and no data is pending, or
    /// after a terminal fault. A line that fails JSON decoding yields
    /// [`BridgeError::Decode`] carrying the raw line and fuses the stream;
    /// it is never skipped. Whitespace-only lines carry no record and are
    /// ignored; a final partial line with no trailing newline is decoded
    /// like any other.
    pub async fn next_record(&mut self) -> Option<Result<Value, BridgeError>> {
        if self.fused {
            return None;
        }

        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(trimmed) {
                        Ok(record) => return Some(Ok(record)),
                        Err(source) => {
                            self.fused = true;
                            return Some(Err(BridgeError::Decode {
                                line: trimmed.to_string(),
                                source,
                            }));
                        }
                    }
                }
                Ok(None) => {
                    self.fused = true;
                    return None;
                }
                Err(e) => {
                    self.fused = true;
                    return Some(Err(BridgeError::Io {
                        reason: format!("failed to read child stdout: {e}"),
                    }));
                }
            }
        }
    }

    /// Drain the rest of the stream into a vector.
    ///
    /// Stops at the first error; records decoded before it are lost to the
    /// caller, so prefer [`next_record`](Self::next_record) when partial
    /// results matter.
    pub async fn collect_records(&mut self) -> Result<Vec<Value>, BridgeError> {
        let mut records = Vec::new();
        while let Some(next) = self.next_record().await {
            records.push(next?);
        }
        Ok(records)
    }

    /// OS process id of the child, while it is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit and return its out-of-band exit report.
    ///
    /// Remaining unread stdout is drained and discarded first so the child
    /// is never stuck on a full pipe. A non-zero exit is *not* an error
    /// here: all successfully decoded records have already been delivered,
    /// and callers that care inspect [`ExitReport`].
    pub async fn finish(mut self) -> Result<ExitReport, BridgeError> {
        while let Ok(Some(_)) = self.lines.next_line().await {}

        let status = match self.status {
            Some(status) => status,
            None => self.child.wait().await.map_err(|e| BridgeError::Io {
                reason: format!("failed to wait for child: {e}"),
            })?,
        };

        let stderr_tail = match self.stderr_task.take() {
            Some(task) => task
                .await
                .map(|tail| tail.to_string())
                .unwrap_or_default(),
            None => String::new(),
        };

        Ok(ExitReport {
            exit_code: status.code(),
            stderr_tail,
        })
    }

    /// Terminate the child: TERM to its process group, a short grace
    /// window, then KILL. Safe to call after the child has already exited.
    pub async fn terminate(&mut self) -> Result<(), BridgeError> {
        self.fused = true;

        if self.status.is_some() {
            return Ok(());
        }

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            use nix::sys::signal::{Signal, killpg};
            use nix::unistd::Pid;

            let pgid = Pid::from_raw(pid as i32);
            if killpg(pgid, Signal::SIGTERM).is_ok() {
                match tokio::time::timeout(TERM_GRACE, self.child.wait()).await {
                    Ok(Ok(status)) => {
                        self.status = Some(status);
                        return Ok(());
                    }
                    Ok(Err(e)) => {
                        return Err(BridgeError::Io {
                            reason: format!("failed to wait for child: {e}"),
                        });
                    }
                    Err(_) => {
                        let _ = killpg(pgid, Signal::SIGKILL);
                    }
                }
            }
        }

        match self.child.kill().await {
            Ok(()) => {}
            // Child already exited between the check and the signal.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => {
                return Err(BridgeError::Io {
                    reason: format!("failed to kill child: {e}"),
                });
            }
        }

        let status = self.child.wait().await.map_err(|e| BridgeError::Io {
            reason: format!("failed to wait for child: {e}"),
        })?;
        self.status = Some(status);
        Ok(())
    }
}

/// Out-of-band exit information, available once the stream has ended.
///
/// Abnormal exit is surfaced here instead of through per-record errors:
/// partial or complete valid output may well have been produced before the
/// child failed.
#[derive(Debug)]
pub struct ExitReport {
    /// Exit code, or `None` if the child was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Bounded tail of the child's stderr.
    pub stderr_tail: String,
}

impl ExitReport {
    /// Whether the child exited cleanly.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
