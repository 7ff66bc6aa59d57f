use process_runner::RunnerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Fetching tool failed: {0}")]
    ToolFailed(String),

    #[error("No usable metadata for {0}")]
    NoMetadata(String),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}
