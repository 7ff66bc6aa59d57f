mod command;
mod error;
mod grammar;
pub mod job;
mod presets;

pub use command::{probe_command, transcode_command, ConversionRequest, FFMPEG};
pub use error::ConvertError;
pub use grammar::{FrameUpdate, ProgressThrottle, TranscodeGrammar};
pub use presets::{audio_args, is_audio_format, video_args, AUDIO_CODECS, VIDEO_CONTAINERS};
