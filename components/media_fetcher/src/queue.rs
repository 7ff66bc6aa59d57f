//! Fetch-queue job controller.
//!
//! URLs run strictly in order. A failing URL reports its own `Failed`
//! event and the queue moves on; one `Completed` closes the whole
//! queue. Cancellation aborts the queue wherever it stands.

use crate::config::FetchConfig;
use crate::grammar;
use crate::types::FetchRequest;
use crate::ytdlp;
use async_trait::async_trait;
use media_primitives::{JobOutcome, ProgressEvent};
use process_runner::ToolRunner;
use serde_json::Value;
use std::io;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CANCELLED_MESSAGE: &str = "cancelled by user";

/// Sink for successfully fetched titles; the history component
/// implements it. Recording failures never fail the queue.
#[async_trait]
pub trait CompletionLog: Send + Sync {
    async fn record_completion(&self, title: &str) -> io::Result<()>;
}

enum UrlEnd {
    Cancelled,
    Failed(String),
}

/// Run one fetch queue to completion.
pub async fn run(
    runner: &dyn ToolRunner,
    request: FetchRequest,
    config: FetchConfig,
    cancel: CancellationToken,
    events: mpsc::Sender<ProgressEvent>,
    completions: &dyn CompletionLog,
) -> JobOutcome {
    for url in &request.urls {
        if cancel.is_cancelled() {
            return cancelled(&events).await;
        }

        let title = match ytdlp::fetch_metadata(runner, url, &config).await {
            Ok(info) => title_of(&info, url),
            Err(error) => {
                tracing::warn!(%error, url = %url, "skipping URL after metadata failure");
                let _ = events
                    .send(ProgressEvent::Failed {
                        message: format!("{url}: {error}"),
                    })
                    .await;
                continue;
            }
        };

        if cancel.is_cancelled() {
            return cancelled(&events).await;
        }
        let _ = events
            .send(ProgressEvent::Started {
                title: title.clone(),
            })
            .await;

        match download_one(runner, url, &request, &config, &cancel, &events).await {
            Ok(()) => {
                tracing::info!(title = %title, "download finished");
                if let Err(error) = completions.record_completion(&title).await {
                    tracing::warn!(%error, "could not record download history");
                }
            }
            Err(UrlEnd::Cancelled) => return cancelled(&events).await,
            Err(UrlEnd::Failed(message)) => {
                tracing::warn!(url = %url, message = %message, "download failed, continuing the queue");
                let _ = events.send(ProgressEvent::Failed { message }).await;
            }
        }
    }

    let _ = events.send(ProgressEvent::Completed).await;
    JobOutcome::Completed
}

async fn download_one(
    runner: &dyn ToolRunner,
    url: &str,
    request: &FetchRequest,
    config: &FetchConfig,
    cancel: &CancellationToken,
    events: &mpsc::Sender<ProgressEvent>,
) -> Result<(), UrlEnd> {
    let command = ytdlp::download_command(url, request, config);
    let mut process = runner
        .start(command)
        .await
        .map_err(|error| UrlEnd::Failed(error.to_string()))?;

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                process.terminate();
                process.wait().await;
                return Err(UrlEnd::Cancelled);
            }
            line = process.next_line() => line,
        };

        let Some(line) = line else { break };
        match grammar::parse_progress_line(&line) {
            Some(progress) => {
                if let Some(event) = progress.to_event() {
                    let _ = events.send(event).await;
                }
            }
            None => tracing::debug!(line = %line, "skipping unrecognized tool output"),
        }
    }

    let exit = process.wait().await;
    if exit.success() {
        Ok(())
    } else {
        Err(UrlEnd::Failed(exit.stderr.trim().to_string()))
    }
}

fn title_of(info: &Value, url: &str) -> String {
    info.get("title")
        .and_then(Value::as_str)
        .filter(|title| !title.is_empty())
        .unwrap_or(url)
        .to_string()
}

async fn cancelled(events: &mpsc::Sender<ProgressEvent>) -> JobOutcome {
    let _ = events
        .send(ProgressEvent::Failed {
            message: CANCELLED_MESSAGE.to_string(),
        })
        .await;
    JobOutcome::Cancelled
}
