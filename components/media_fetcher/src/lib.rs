mod config;
mod error;
mod grammar;
pub mod queue;
mod resolver;
mod types;
mod ytdlp;

pub use config::FetchConfig;
pub use error::FetchError;
pub use grammar::{parse_progress_line, FetchProgress, FetchStatus};
pub use queue::CompletionLog;
pub use resolver::{classify, resolve, FormatDescriptor, ResolvedFormats};
pub use types::FetchRequest;
pub use ytdlp::{download_command, fetch_metadata, metadata_command, YTDLP};
