use crate::command::{CaptureMode, ToolCommand};
use crate::process::{ToolExit, ToolProcess};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use thiserror::Error;

const LINE_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        source: io::Error,
    },
}

/// Starts external tool processes. The trait exists so job controllers
/// can be driven by scripted processes in tests.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Locate the tool without starting it.
    fn check_available(&self, program: &str) -> Result<(), RunnerError>;

    async fn start(&self, command: ToolCommand) -> Result<ToolProcess, RunnerError>;
}

/// Spawns real processes, resolving program names through PATH with
/// optional explicit path overrides.
#[derive(Default)]
pub struct SystemRunner {
    overrides: HashMap<String, PathBuf>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary path for `program` instead of PATH lookup.
    pub fn with_override(mut self, program: impl Into<String>, path: PathBuf) -> Self {
        self.overrides.insert(program.into(), path);
        self
    }

    fn locate(&self, program: &str) -> Result<PathBuf, RunnerError> {
        if let Some(path) = self.overrides.get(program) {
            return Ok(path.clone());
        }
        which::which(program).map_err(|_| RunnerError::ToolNotFound(program.to_string()))
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    fn check_available(&self, program: &str) -> Result<(), RunnerError> {
        self.locate(program).map(|_| ())
    }

    async fn start(&self, command: ToolCommand) -> Result<ToolProcess, RunnerError> {
        let path = self.locate(&command.program)?;
        tracing::debug!(program = %command.program, args = ?command.args, "starting tool");

        let spawn_failed = |source| RunnerError::SpawnFailed {
            program: command.program.clone(),
            source,
        };

        let mut child = Command::new(&path)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_failed)?;

        let Some(stdout) = child.stdout.take() else {
            return Err(spawn_failed(io::Error::other("stdout pipe missing")));
        };
        let Some(stderr) = child.stderr.take() else {
            return Err(spawn_failed(io::Error::other("stderr pipe missing")));
        };

        let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
        let (exit_tx, exit_rx) = oneshot::channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        tokio::spawn(supervise(
            child,
            stdout,
            stderr,
            command.capture,
            line_tx,
            exit_tx,
            kill_rx,
        ));

        Ok(ToolProcess::new(line_rx, exit_rx, kill_tx))
    }
}

/// Owns the child for its whole life: pumps both output pipes, reacts
/// to a kill request, and always delivers an exit report.
async fn supervise(
    mut child: Child,
    stdout: impl AsyncRead + Unpin + Send + 'static,
    stderr: impl AsyncRead + Unpin + Send + 'static,
    capture: CaptureMode,
    line_tx: mpsc::Sender<String>,
    exit_tx: oneshot::Sender<ToolExit>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let stderr_lines = match capture {
        CaptureMode::Combined => Some(line_tx.clone()),
        CaptureMode::Split => None,
    };
    let stderr_pump = tokio::spawn(pump_stderr(stderr, stderr_lines));
    let stdout_pump = tokio::spawn(pump_stdout(stdout, line_tx));

    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut kill_rx => {
            if let Err(error) = child.start_kill() {
                tracing::warn!(%error, "failed to kill tool process");
            }
            child.wait().await
        }
    };

    // Pipes close when the child exits, so both pumps finish on their own.
    let _ = stdout_pump.await;
    let stderr = stderr_pump.await.unwrap_or_default();
    let code = status.ok().and_then(|s| s.code());
    let _ = exit_tx.send(ToolExit { code, stderr });
}

async fn pump_stdout(stdout: impl AsyncRead + Unpin, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

async fn pump_stderr(stderr: impl AsyncRead + Unpin, mut tx: Option<mpsc::Sender<String>>) -> String {
    let mut collected = String::new();
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        collected.push_str(&line);
        collected.push('\n');
        if let Some(sender) = &tx {
            if sender.send(line).await.is_err() {
                // Receiver is gone; keep collecting for the exit report.
                tx = None;
            }
        }
    }
    collected
}
