use crate::error::ConvertError;
use media_primitives::QualityTier;

/// Audio codecs the engine can target directly. A request naming one of
/// these drops the video stream entirely.
pub const AUDIO_CODECS: [&str; 6] = ["mp3", "ogg", "opus", "wav", "m4a", "aac"];

/// Video containers with a preset fragment for every quality tier.
pub const VIDEO_CONTAINERS: [&str; 4] = ["mp4", "webm", "mkv", "avi"];

pub fn is_audio_format(format: &str) -> bool {
    AUDIO_CODECS.contains(&format)
}

/// Encoder flags for an audio-only target.
pub fn audio_args(codec: &str) -> Result<&'static [&'static str], ConvertError> {
    let args: &'static [&'static str] = match codec {
        "mp3" => &["-acodec", "libmp3lame", "-q:a", "2"],
        "ogg" => &["-acodec", "libvorbis", "-q:a", "4"],
        "opus" => &["-acodec", "libopus", "-b:a", "128k"],
        "wav" => &["-acodec", "pcm_s16le"],
        "m4a" | "aac" => &["-c:a", "aac", "-b:a", "192k"],
        other => return Err(ConvertError::UnsupportedFormat(other.to_string())),
    };
    Ok(args)
}

/// Encoder flags for a video target at the given quality tier.
pub fn video_args(
    container: &str,
    tier: QualityTier,
) -> Result<Vec<&'static str>, ConvertError> {
    let args = match container {
        "mp4" => {
            let (preset, crf) = x264_settings(tier);
            vec![
                "-c:v", "libx264", "-preset", preset, "-crf", crf,
                "-movflags", "+faststart",
            ]
        }
        "mkv" | "avi" => {
            let (preset, crf) = x264_settings(tier);
            vec!["-c:v", "libx264", "-preset", preset, "-crf", crf]
        }
        "webm" => {
            vec![
                "-c:v", "libvpx-vp9", "-crf", vp9_crf(tier), "-b:v", "0",
                "-row-mt", "1", "-tile-columns", "2",
            ]
        }
        other => return Err(ConvertError::UnsupportedFormat(other.to_string())),
    };
    Ok(args)
}

fn x264_settings(tier: QualityTier) -> (&'static str, &'static str) {
    match tier {
        QualityTier::Highest => ("slow", "18"),
        QualityTier::High => ("medium", "20"),
        QualityTier::Medium => ("medium", "23"),
        QualityTier::Low => ("veryfast", "28"),
    }
}

fn vp9_crf(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Highest => "24",
        QualityTier::High => "27",
        QualityTier::Medium => "30",
        QualityTier::Low => "35",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn every_container_and_tier_has_a_preset() {
        for container in VIDEO_CONTAINERS {
            for tier in QualityTier::ALL {
                let args = video_args(container, tier).unwrap();
                assert!(
                    !args.is_empty(),
                    "empty preset for {container} at {tier}"
                );
            }
        }
    }

    #[test]
    fn every_audio_codec_has_encoder_flags() {
        for codec in AUDIO_CODECS {
            let args = audio_args(codec).unwrap();
            assert!(!args.is_empty(), "empty flags for {codec}");
        }
    }

    #[test]
    fn unknown_container_is_unsupported() {
        assert_matches!(
            video_args("flv", QualityTier::Medium),
            Err(ConvertError::UnsupportedFormat(format)) => assert_eq!(format, "flv")
        );
    }

    #[test]
    fn unknown_audio_codec_is_unsupported() {
        assert_matches!(
            audio_args("ape"),
            Err(ConvertError::UnsupportedFormat(_))
        );
    }

    #[test]
    fn tiers_trade_size_for_speed() {
        let (slow_preset, best_crf) = x264_settings(QualityTier::Highest);
        let (fast_preset, worst_crf) = x264_settings(QualityTier::Low);
        assert_eq!(slow_preset, "slow");
        assert_eq!(fast_preset, "veryfast");
        assert!(best_crf < worst_crf, "lower CRF means higher quality");
    }

    #[test]
    fn mp4_enables_faststart() {
        let args = video_args("mp4", QualityTier::High).unwrap();
        assert!(args.contains(&"+faststart"));
        let args = video_args("mkv", QualityTier::High).unwrap();
        assert!(!args.contains(&"+faststart"));
    }
}
