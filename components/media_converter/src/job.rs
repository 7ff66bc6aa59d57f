//! Conversion job controller: probe, spawn, stream, finish.

use crate::command::{probe_command, transcode_command, ConversionRequest};
use crate::grammar::{ProgressThrottle, TranscodeGrammar};
use media_primitives::{JobOutcome, ProgressEvent};
use process_runner::ToolRunner;
use std::path::Path;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CANCELLED_MESSAGE: &str = "cancelled by user";

/// Run one conversion to completion.
///
/// The controller never returns an error: every way a job can end is
/// reported as a terminal event on `events` and as the returned
/// [`JobOutcome`]. Cancellation is observed before each output line
/// and at process exit.
pub async fn run(
    runner: &dyn ToolRunner,
    request: ConversionRequest,
    cancel: CancellationToken,
    events: mpsc::Sender<ProgressEvent>,
) -> JobOutcome {
    let command = match transcode_command(&request) {
        Ok(command) => command,
        Err(error) => return fail(&events, error.to_string()).await,
    };

    let total_seconds = probe_duration(runner, &request.input).await;
    if total_seconds.is_none() {
        tracing::warn!(input = %request.input.display(), "duration unknown, progress fraction disabled");
    }

    let title = request
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| request.input.display().to_string());
    let _ = events.send(ProgressEvent::Started { title }).await;

    let mut process = match runner.start(command).await {
        Ok(process) => process,
        Err(error) => return fail(&events, error.to_string()).await,
    };

    let grammar = TranscodeGrammar::new();
    let mut throttle = ProgressThrottle::new(total_seconds);

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                process.terminate();
                process.wait().await;
                let _ = events
                    .send(ProgressEvent::Failed { message: CANCELLED_MESSAGE.to_string() })
                    .await;
                return JobOutcome::Cancelled;
            }
            line = process.next_line() => line,
        };

        let Some(line) = line else { break };
        match grammar.parse_frame_line(&line) {
            Some(update) => {
                if let Some(event) = throttle.admit(&update) {
                    let _ = events.send(event).await;
                }
            }
            None => tracing::debug!(line = %line, "skipping unrecognized engine output"),
        }
    }

    let exit = process.wait().await;
    if !exit.success() {
        return fail(
            &events,
            format!("transcoding engine error: {}", exit.stderr.trim()),
        )
        .await;
    }

    let _ = events.send(throttle.finish()).await;
    let _ = events.send(ProgressEvent::Completed).await;
    JobOutcome::Completed
}

/// Probe the input duration through an info-only engine run. Any
/// failure degrades to an unknown duration; it never fails the job.
async fn probe_duration(runner: &dyn ToolRunner, input: &Path) -> Option<f64> {
    let grammar = TranscodeGrammar::new();
    let mut process = match runner.start(probe_command(input)).await {
        Ok(process) => process,
        Err(error) => {
            tracing::warn!(%error, "duration probe failed to start");
            return None;
        }
    };

    let mut duration = None;
    while let Some(line) = process.next_line().await {
        if let Some(seconds) = grammar.parse_duration(&line) {
            duration = Some(seconds);
        }
    }
    // The probe exits non-zero because no output file is given.
    process.wait().await;
    duration.filter(|seconds| *seconds > 0.0)
}

async fn fail(events: &mpsc::Sender<ProgressEvent>, message: String) -> JobOutcome {
    let _ = events
        .send(ProgressEvent::Failed {
            message: message.clone(),
        })
        .await;
    JobOutcome::Failed(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use media_primitives::QualityTier;
    use process_runner::{RunnerError, ToolCommand, ToolExit, ToolProcess};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct RunnerStub {
        scripts: Mutex<VecDeque<(Vec<String>, ToolExit)>>,
        commands: Mutex<Vec<ToolCommand>>,
    }

    impl RunnerStub {
        fn new(scripts: Vec<(Vec<&str>, ToolExit)>) -> Self {
            Self {
                scripts: Mutex::new(
                    scripts
                        .into_iter()
                        .map(|(lines, exit)| {
                            (lines.into_iter().map(String::from).collect(), exit)
                        })
                        .collect(),
                ),
                commands: Mutex::new(Vec::new()),
            }
        }

        fn started_commands(&self) -> Vec<ToolCommand> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolRunner for RunnerStub {
        fn check_available(&self, _program: &str) -> Result<(), RunnerError> {
            Ok(())
        }

        async fn start(&self, command: ToolCommand) -> Result<ToolProcess, RunnerError> {
            self.commands.lock().unwrap().push(command);
            let (lines, exit) = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("job started more processes than scripted");
            Ok(ToolProcess::scripted(lines, exit))
        }
    }

    fn ok_exit() -> ToolExit {
        ToolExit {
            code: Some(0),
            stderr: String::new(),
        }
    }

    fn probe_script() -> (Vec<&'static str>, ToolExit) {
        (
            vec!["  Duration: 00:01:30.50, start: 0.000000, bitrate: 1411 kb/s"],
            ToolExit {
                code: Some(1),
                stderr: "At least one output file must be specified".to_string(),
            },
        )
    }

    fn request(format: &str) -> ConversionRequest {
        ConversionRequest {
            input: PathBuf::from("clip.mov"),
            output: PathBuf::from(format!("clip.{format}")),
            format: format.to_string(),
            tier: QualityTier::Medium,
        }
    }

    async fn run_and_collect(
        runner: &RunnerStub,
        request: ConversionRequest,
        cancel: CancellationToken,
    ) -> (JobOutcome, Vec<ProgressEvent>) {
        let (tx, mut rx) = mpsc::channel(16);
        tokio::join!(run(runner, request, cancel, tx), async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        })
    }

    #[tokio::test]
    async fn successful_run_ends_at_exactly_one() {
        let runner = RunnerStub::new(vec![
            probe_script(),
            (
                vec![
                    "frame=  100 fps= 50 q=28.0 size= 256kB time=00:00:04.00 bitrate= 500.0kbits/s speed=2.0x",
                    "frame= 1000 fps= 50 q=28.0 size= 999kB time=00:01:20.00 bitrate= 500.0kbits/s speed=2.0x",
                ],
                ok_exit(),
            ),
        ]);

        let (outcome, events) =
            run_and_collect(&runner, request("mp4"), CancellationToken::new()).await;

        assert_eq!(outcome, JobOutcome::Completed);
        assert_eq!(events.last(), Some(&ProgressEvent::Completed));

        let fractions: Vec<f64> = events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Converting { fraction, .. } => *fraction,
                _ => None,
            })
            .collect();
        assert!(
            fractions.windows(2).all(|pair| pair[0] <= pair[1]),
            "fractions must be monotone: {fractions:?}"
        );
        assert_eq!(fractions.last(), Some(&1.0));
    }

    #[tokio::test]
    async fn unsupported_format_spawns_nothing() {
        let runner = RunnerStub::new(Vec::new());

        let (outcome, events) =
            run_and_collect(&runner, request("flv"), CancellationToken::new()).await;

        assert!(matches!(outcome, JobOutcome::Failed(message) if message.contains("flv")));
        assert!(matches!(
            events.as_slice(),
            [ProgressEvent::Failed { .. }]
        ));
        assert!(runner.started_commands().is_empty(), "no process may start");
    }

    #[tokio::test]
    async fn engine_failure_carries_stderr() {
        let runner = RunnerStub::new(vec![
            probe_script(),
            (
                Vec::new(),
                ToolExit {
                    code: Some(1),
                    stderr: "clip.mov: Invalid data found".to_string(),
                },
            ),
        ]);

        let (outcome, events) =
            run_and_collect(&runner, request("mp4"), CancellationToken::new()).await;

        assert!(
            matches!(&outcome, JobOutcome::Failed(message) if message.contains("Invalid data")),
            "unexpected outcome: {outcome:?}"
        );
        assert!(!events.contains(&ProgressEvent::Completed));
    }

    #[tokio::test]
    async fn cancellation_wins_over_pending_output() {
        let runner = RunnerStub::new(vec![
            probe_script(),
            (
                vec!["frame=  100 fps= 50 q=28.0 size= 256kB time=00:00:04.00 bitrate= 500.0kbits/s speed=2.0x"],
                ok_exit(),
            ),
        ]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let (outcome, events) = run_and_collect(&runner, request("mp4"), cancel).await;

        assert_eq!(outcome, JobOutcome::Cancelled);
        assert!(!events.contains(&ProgressEvent::Completed));
        assert!(events.iter().any(|event| matches!(
            event,
            ProgressEvent::Failed { message } if message == "cancelled by user"
        )));
    }

    #[tokio::test]
    async fn stale_cancelled_token_does_not_poison_a_fresh_run() {
        let stale = CancellationToken::new();
        stale.cancel();
        stale.cancel();

        let runner = RunnerStub::new(vec![probe_script(), (Vec::new(), ok_exit())]);
        let (outcome, _events) =
            run_and_collect(&runner, request("mp4"), CancellationToken::new()).await;

        assert_eq!(outcome, JobOutcome::Completed);
    }

    #[tokio::test]
    async fn failed_probe_degrades_to_unknown_duration() {
        let runner = RunnerStub::new(vec![
            (
                vec!["clip.mov: No such file or directory"],
                ToolExit {
                    code: Some(1),
                    stderr: String::new(),
                },
            ),
            (
                vec!["frame=  100 fps= 50 q=28.0 size= 256kB time=00:00:04.00 bitrate= 500.0kbits/s speed=2.0x"],
                ok_exit(),
            ),
        ]);

        let (outcome, events) =
            run_and_collect(&runner, request("mp4"), CancellationToken::new()).await;

        assert_eq!(outcome, JobOutcome::Completed);
        let live_fractions: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Converting { fraction, total_seconds, .. } => {
                    Some((*fraction, *total_seconds))
                }
                _ => None,
            })
            .collect();
        // Live updates carry no fraction; only the pinned final event does.
        assert_eq!(live_fractions[0], (None, None));
        assert_eq!(live_fractions.last(), Some(&(Some(1.0), None)));
    }
}
