// bases/media_cli/src/app.rs
use crate::args::{Args, Command};
use crate::config::Config;
use crate::output::OutputHandler;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use download_history::HistoryStore;
use media_converter::ConversionRequest;
use media_fetcher::FetchRequest;
use media_primitives::{JobOutcome, ProgressEvent};
use process_runner::{SystemRunner, ToolRunner};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const EVENT_BUFFER: usize = 64;

pub struct App {
    args: Args,
    config: Config,
    output: OutputHandler,
}

impl App {
    pub fn new(args: Args) -> Self {
        let config = Config::load(&args.config);
        let output = OutputHandler::new(args.verbose);
        Self {
            args,
            config,
            output,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let runner = SystemRunner::new();

        match &self.args.command {
            Command::Convert {
                input,
                output,
                format,
                quality,
            } => {
                runner.check_available(media_converter::FFMPEG)?;
                let request = ConversionRequest {
                    input: input.clone(),
                    output: output.clone(),
                    format: format.clone(),
                    tier: *quality,
                };
                let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
                let cancel = CancellationToken::new();
                self.drive(
                    media_converter::job::run(&runner, request, cancel.clone(), events_tx),
                    events_rx,
                    cancel,
                )
                .await
            }

            Command::Fetch {
                urls,
                output_dir,
                format,
                kind,
            } => {
                runner.check_available(media_fetcher::YTDLP)?;
                let output_dir = output_dir.clone().unwrap_or_else(|| self.config.output_dir());
                std::fs::create_dir_all(&output_dir)?;
                let request = FetchRequest {
                    urls: urls.clone(),
                    output_dir,
                    format_id: format.clone(),
                    kind: *kind,
                };
                let history = HistoryStore::new(self.config.history_file());
                let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
                let cancel = CancellationToken::new();
                self.drive(
                    media_fetcher::queue::run(
                        &runner,
                        request,
                        self.config.fetch_config(),
                        cancel.clone(),
                        events_tx,
                        &history,
                    ),
                    events_rx,
                    cancel,
                )
                .await
            }

            Command::Formats { url } => {
                runner.check_available(media_fetcher::YTDLP)?;
                let resolved =
                    media_fetcher::resolve(&runner, url, &self.config.fetch_config()).await;
                self.output.print_formats(&resolved);
                Ok(())
            }

            Command::History => {
                let history = HistoryStore::new(self.config.history_file());
                self.output.print_history(&history.list());
                Ok(())
            }
        }
    }

    /// Run one job to its outcome while rendering its event stream.
    /// Ctrl-C trips the job's own fresh cancellation token.
    async fn drive<F>(
        &self,
        job: F,
        mut events: mpsc::Receiver<ProgressEvent>,
        cancel: CancellationToken,
    ) -> Result<()>
    where
        F: Future<Output = JobOutcome>,
    {
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let render = async {
            while let Some(event) = events.recv().await {
                self.output.print_event(&event);
            }
        };
        let (outcome, ()) = tokio::join!(job, render);

        match outcome {
            JobOutcome::Completed => Ok(()),
            JobOutcome::Cancelled => {
                self.output.print_cancelled();
                Ok(())
            }
            JobOutcome::Failed(message) => Err(eyre!(message)),
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
