use crate::error::ConvertError;
use crate::presets;
use media_primitives::QualityTier;
use process_runner::{CaptureMode, ToolCommand};
use std::path::{Path, PathBuf};

/// Program name of the transcoding engine, resolved through the runner.
pub const FFMPEG: &str = "ffmpeg";

/// One transcode, owned by the job controller for its whole run.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Target container or audio codec, e.g. "mp4" or "opus".
    pub format: String,
    pub tier: QualityTier,
}

/// Info-only invocation whose banner output carries the input duration.
/// The engine exits non-zero without an output file; that is expected.
pub fn probe_command(input: &Path) -> ToolCommand {
    ToolCommand::new(FFMPEG, CaptureMode::Combined)
        .arg("-hide_banner")
        .arg("-i")
        .arg(input.to_string_lossy())
}

/// Full transcode invocation for the request, or `UnsupportedFormat`
/// before anything is spawned.
pub fn transcode_command(request: &ConversionRequest) -> Result<ToolCommand, ConvertError> {
    let format = request.format.to_ascii_lowercase();

    let mut command = ToolCommand::new(FFMPEG, CaptureMode::Combined)
        .arg("-i")
        .arg(request.input.to_string_lossy())
        .arg("-y")
        .args(["-progress", "pipe:1"])
        .args(["-threads", "0"]);

    if presets::is_audio_format(&format) {
        command = command.arg("-vn").args(presets::audio_args(&format)?.iter().copied());
    } else {
        command = command.args(presets::video_args(&format, request.tier)?);
        // Video targets always get a fresh high-quality audio track.
        command = command.args(["-c:a", "aac", "-b:a", "192k", "-ar", "48000"]);
    }

    Ok(command.arg(request.output.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(format: &str, tier: QualityTier) -> ConversionRequest {
        ConversionRequest {
            input: PathBuf::from("clip.mov"),
            output: PathBuf::from(format!("clip.{format}")),
            format: format.to_string(),
            tier,
        }
    }

    #[test]
    fn audio_targets_drop_the_video_stream() {
        let command = transcode_command(&request("opus", QualityTier::Medium)).unwrap();
        assert!(command.args.contains(&"-vn".to_string()));
        assert!(command.args.contains(&"libopus".to_string()));
        assert!(!command.args.contains(&"-c:v".to_string()));
    }

    #[test]
    fn video_targets_carry_preset_and_audio_track() {
        let command = transcode_command(&request("mp4", QualityTier::Highest)).unwrap();
        assert!(command.args.contains(&"libx264".to_string()));
        assert!(command.args.contains(&"48000".to_string()));
        assert_eq!(command.args.last().map(String::as_str), Some("clip.mp4"));
    }

    #[test]
    fn progress_is_requested_on_stdout() {
        let command = transcode_command(&request("mkv", QualityTier::Low)).unwrap();
        let args = command.args.join(" ");
        assert!(args.contains("-progress pipe:1"));
        assert_eq!(command.capture, CaptureMode::Combined);
    }

    #[test]
    fn format_matching_ignores_case() {
        assert!(transcode_command(&request("MP4", QualityTier::Medium)).is_ok());
    }

    #[test]
    fn unsupported_format_fails_before_spawn() {
        assert_matches!(
            transcode_command(&request("flv", QualityTier::Medium)),
            Err(ConvertError::UnsupportedFormat(_))
        );
    }
}
