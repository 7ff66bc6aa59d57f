use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::types::FetchRequest;
use process_runner::{CaptureMode, ToolCommand, ToolRunner};
use serde_json::Value;
use url::Url;

/// Program name of the fetching tool, resolved through the runner.
pub const YTDLP: &str = "yt-dlp";

/// Each progress line arrives as `download:` followed by one JSON
/// object, the structured counterpart of the tool's progress hooks.
const PROGRESS_TEMPLATE: &str = "download:%(progress)j";

/// Metadata-only invocation: one JSON document on stdout, no download.
pub fn metadata_command(url: &str, config: &FetchConfig) -> ToolCommand {
    let mut command = ToolCommand::new(YTDLP, CaptureMode::Split).args([
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
    ]);
    if let Some(cookies) = &config.cookie_file {
        command = command.arg("--cookies").arg(cookies.to_string_lossy());
    }
    command.arg(url)
}

/// Download invocation emitting one parseable progress line per update.
pub fn download_command(url: &str, request: &FetchRequest, config: &FetchConfig) -> ToolCommand {
    let output_template = request.output_dir.join("%(title)s.%(ext)s");
    let mut command = ToolCommand::new(YTDLP, CaptureMode::Split)
        .args(["-f", request.format_selector()])
        .arg("-o")
        .arg(output_template.to_string_lossy())
        .arg("--no-playlist")
        .arg("--newline")
        .args(["--progress-template", PROGRESS_TEMPLATE]);
    if let Some(cookies) = &config.cookie_file {
        command = command.arg("--cookies").arg(cookies.to_string_lossy());
    }
    command.arg(url)
}

/// Fetch the full metadata document for one URL.
pub async fn fetch_metadata(
    runner: &dyn ToolRunner,
    url: &str,
    config: &FetchConfig,
) -> Result<Value, FetchError> {
    Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

    let mut process = runner.start(metadata_command(url, config)).await?;
    let mut raw = String::new();
    while let Some(line) = process.next_line().await {
        raw.push_str(&line);
        raw.push('\n');
    }

    let exit = process.wait().await;
    if !exit.success() {
        return Err(FetchError::ToolFailed(exit.stderr.trim().to_string()));
    }

    serde_json::from_str(&raw).map_err(|_| FetchError::NoMetadata(url.to_string()))
}
