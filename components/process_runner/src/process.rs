use tokio::sync::{mpsc, oneshot};

const LINE_BUFFER: usize = 64;

/// Exit report for a supervised tool process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    /// Process exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Everything the tool wrote to stderr, for error messages.
    pub stderr: String,
}

impl ToolExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Handle to a running (or scripted) tool process.
///
/// Output arrives as lines in write order through [`next_line`];
/// [`wait`] resolves with the exit report once the process is gone and
/// resolves deterministically even after [`terminate`].
///
/// [`next_line`]: ToolProcess::next_line
/// [`wait`]: ToolProcess::wait
/// [`terminate`]: ToolProcess::terminate
pub struct ToolProcess {
    lines: mpsc::Receiver<String>,
    exit: oneshot::Receiver<ToolExit>,
    kill: Option<oneshot::Sender<()>>,
}

impl ToolProcess {
    pub(crate) fn new(
        lines: mpsc::Receiver<String>,
        exit: oneshot::Receiver<ToolExit>,
        kill: oneshot::Sender<()>,
    ) -> Self {
        Self {
            lines,
            exit,
            kill: Some(kill),
        }
    }

    /// Assemble a process from pre-recorded output, so controllers can
    /// be exercised without spawning anything.
    pub fn scripted(lines: Vec<String>, exit: ToolExit) -> Self {
        let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            for line in lines {
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
            let _ = exit_tx.send(exit);
        });
        Self {
            lines: line_rx,
            exit: exit_rx,
            kill: None,
        }
    }

    /// Next line of tool output; `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Ask the supervisor to kill the underlying process. Calling it
    /// again, or on a scripted process, is a no-op.
    pub fn terminate(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }

    /// Wait for the process to finish and collect its exit report.
    pub async fn wait(self) -> ToolExit {
        self.exit.await.unwrap_or(ToolExit {
            code: None,
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_process_replays_lines_in_order() {
        let mut process = ToolProcess::scripted(
            vec!["one".to_string(), "two".to_string()],
            ToolExit {
                code: Some(0),
                stderr: String::new(),
            },
        );

        assert_eq!(process.next_line().await.as_deref(), Some("one"));
        assert_eq!(process.next_line().await.as_deref(), Some("two"));
        assert_eq!(process.next_line().await, None);

        let exit = process.wait().await;
        assert!(exit.success());
    }

    #[tokio::test]
    async fn terminate_on_scripted_process_is_harmless() {
        let mut process = ToolProcess::scripted(
            Vec::new(),
            ToolExit {
                code: Some(1),
                stderr: "boom".to_string(),
            },
        );

        process.terminate();
        process.terminate();
        assert_eq!(process.next_line().await, None);

        let exit = process.wait().await;
        assert!(!exit.success());
        assert_eq!(exit.stderr, "boom");
    }
}
