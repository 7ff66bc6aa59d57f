use crate::config::FetchConfig;
use crate::ytdlp;
use media_primitives::MediaKind;
use process_runner::ToolRunner;
use serde::Serialize;
use serde_json::Value;

/// One selectable stream, classified and labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    /// Tool-facing selector; a video stream without its own audio is
    /// paired as `"<video>+<audio>"` with the best audio stream.
    pub id: String,
    pub label: String,
    pub kind: MediaKind,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    /// kbit/s, from the stream's audio or video bitrate.
    pub bitrate: Option<f64>,
    pub filesize: Option<u64>,
}

/// Resolver output. Empty lists mean the URL offered nothing usable;
/// that is a result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedFormats {
    pub title: String,
    pub audio: Vec<FormatDescriptor>,
    pub video: Vec<FormatDescriptor>,
}

impl ResolvedFormats {
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.video.is_empty()
    }
}

/// Resolve the formats a URL offers. Network and parse failures
/// degrade to an empty result.
pub async fn resolve(runner: &dyn ToolRunner, url: &str, config: &FetchConfig) -> ResolvedFormats {
    match ytdlp::fetch_metadata(runner, url, config).await {
        Ok(info) => classify(&info),
        Err(error) => {
            tracing::warn!(%error, url, "format resolution failed");
            ResolvedFormats::default()
        }
    }
}

/// Classify and sort the streams of one metadata document.
pub fn classify(info: &Value) -> ResolvedFormats {
    let title = info
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let Some(formats) = info.get("formats").and_then(Value::as_array) else {
        return ResolvedFormats {
            title,
            ..ResolvedFormats::default()
        };
    };

    let best_audio_id = best_audio_id(formats);

    let mut audio = Vec::new();
    let mut video = Vec::new();
    for format in formats {
        let Some(id) = format.get("format_id").and_then(Value::as_str) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }

        let has_audio = codec_present(format, "acodec");
        let has_video = codec_present(format, "vcodec");

        if has_video {
            video.push(video_descriptor(format, id, has_audio, best_audio_id.as_deref()));
        } else if has_audio {
            audio.push(audio_descriptor(format, id));
        }
    }

    // Best listed first; sorts are stable so ties keep tool order.
    video.sort_by(|a, b| {
        b.height
            .cmp(&a.height)
            .then_with(|| total_cmp_desc(a.bitrate, b.bitrate))
    });
    audio.sort_by(|a, b| total_cmp_desc(a.bitrate, b.bitrate));

    ResolvedFormats { title, audio, video }
}

/// The audio-only stream with the highest total bitrate, used to pair
/// silent video streams.
fn best_audio_id(formats: &[Value]) -> Option<String> {
    formats
        .iter()
        .filter(|format| codec_present(format, "acodec") && !codec_present(format, "vcodec"))
        .max_by(|a, b| {
            number(a, "tbr")
                .unwrap_or(0.0)
                .total_cmp(&number(b, "tbr").unwrap_or(0.0))
        })
        .and_then(|format| format.get("format_id").and_then(Value::as_str))
        .map(String::from)
}

fn audio_descriptor(format: &Value, id: &str) -> FormatDescriptor {
    let ext = text(format, "ext");
    let codec = codec_name(format, "acodec");
    let bitrate = number(format, "abr").or_else(|| number(format, "tbr"));
    let filesize = number(format, "filesize").map(|size| size as u64);

    let bitrate_text = bitrate.map(|b| format!("{b:.0}kbps")).unwrap_or_default();
    let label = format!(
        "{id} - {ext} audio ({codec}, {bitrate_text}, {size})",
        size = size_text(filesize)
    );

    FormatDescriptor {
        id: id.to_string(),
        label,
        kind: MediaKind::Audio,
        height: None,
        fps: None,
        bitrate,
        filesize,
    }
}

fn video_descriptor(
    format: &Value,
    id: &str,
    has_audio: bool,
    best_audio_id: Option<&str>,
) -> FormatDescriptor {
    let ext = text(format, "ext");
    let codec = codec_name(format, "vcodec");
    let height = number(format, "height").map(|h| h as u32);
    let fps = number(format, "fps").map(|f| f as u32);
    let bitrate = number(format, "vbr").or_else(|| number(format, "tbr"));
    let filesize = number(format, "filesize").map(|size| size as u64);

    let resolution = height
        .map(|h| format!("{h}p"))
        .unwrap_or_else(|| ext.clone());
    let fps_text = fps.map(|f| format!(", {f}fps")).unwrap_or_default();
    let audio_text = if has_audio { " + audio" } else { " (no audio)" };
    let label = format!(
        "{id} - {resolution}{fps_text}{audio_text} ({ext}, {codec}, {size})",
        size = size_text(filesize)
    );

    let id = match (has_audio, best_audio_id) {
        (false, Some(audio_id)) => format!("{id}+{audio_id}"),
        _ => id.to_string(),
    };

    FormatDescriptor {
        id,
        label,
        kind: MediaKind::Video,
        height,
        fps,
        bitrate,
        filesize,
    }
}

/// A codec field counts as present unless it is missing or the `none`
/// sentinel the tool uses for absent streams.
fn codec_present(format: &Value, key: &str) -> bool {
    format
        .get(key)
        .and_then(Value::as_str)
        .map(|codec| !codec.is_empty() && codec != "none")
        .unwrap_or(false)
}

/// Codec name with its profile suffix stripped (`avc1.640028` → `avc1`).
fn codec_name(format: &Value, key: &str) -> String {
    text(format, key)
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn text(format: &Value, key: &str) -> String {
    format
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number(format: &Value, key: &str) -> Option<f64> {
    format.get(key).and_then(Value::as_f64).filter(|n| *n > 0.0)
}

fn size_text(filesize: Option<u64>) -> String {
    match filesize {
        Some(bytes) => format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0)),
        None => "?MB".to_string(),
    }
}

fn total_cmp_desc(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_metadata() -> Value {
        json!({
            "title": "Some Clip",
            "formats": [
                {
                    "format_id": "251",
                    "ext": "webm",
                    "acodec": "opus",
                    "vcodec": "none",
                    "abr": 160.0,
                    "tbr": 160.0,
                    "filesize": 2_097_152
                },
                {
                    "format_id": "140",
                    "ext": "m4a",
                    "acodec": "mp4a.40.2",
                    "abr": 128.0,
                    "tbr": 128.0
                },
                {
                    "format_id": "137",
                    "ext": "mp4",
                    "acodec": "none",
                    "vcodec": "avc1.640028",
                    "height": 1080,
                    "fps": 30,
                    "vbr": 4500.0,
                    "filesize": 12_897_484
                },
                {
                    "format_id": "18",
                    "ext": "mp4",
                    "acodec": "mp4a.40.2",
                    "vcodec": "avc1.42001E",
                    "height": 360,
                    "fps": 30,
                    "tbr": 700.0
                }
            ]
        })
    }

    #[test]
    fn streams_split_by_codec_sentinels() {
        let resolved = classify(&sample_metadata());
        assert_eq!(resolved.title, "Some Clip");
        assert_eq!(resolved.audio.len(), 2);
        assert_eq!(resolved.video.len(), 2);
    }

    #[test]
    fn silent_video_pairs_with_the_best_audio() {
        let resolved = classify(&sample_metadata());
        let top = &resolved.video[0];
        // 251 beats 140 on total bitrate.
        assert_eq!(top.id, "137+251");
        assert!(top.label.contains("no audio"));
    }

    #[test]
    fn video_with_its_own_audio_keeps_its_id() {
        let resolved = classify(&sample_metadata());
        let muxed = resolved.video.iter().find(|f| f.height == Some(360)).unwrap();
        assert_eq!(muxed.id, "18");
        assert!(muxed.label.contains("+ audio"));
    }

    #[test]
    fn video_sorts_by_height_then_bitrate() {
        let resolved = classify(&sample_metadata());
        let heights: Vec<_> = resolved.video.iter().map(|f| f.height).collect();
        assert_eq!(heights, vec![Some(1080), Some(360)]);
    }

    #[test]
    fn audio_sorts_by_bitrate() {
        let resolved = classify(&sample_metadata());
        let ids: Vec<_> = resolved.audio.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["251", "140"]);
    }

    #[test]
    fn labels_describe_the_stream() {
        let resolved = classify(&sample_metadata());
        let top = &resolved.video[0];
        assert_eq!(top.label, "137 - 1080p, 30fps (no audio) (mp4, avc1, 12.3MB)");
        let best_audio = &resolved.audio[0];
        assert_eq!(best_audio.label, "251 - webm audio (opus, 160kbps, 2.0MB)");
    }

    #[test]
    fn missing_formats_resolve_to_empty() {
        let resolved = classify(&json!({"title": "bare"}));
        assert!(resolved.is_empty());
        assert_eq!(resolved.title, "bare");
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let resolved = classify(&json!({
            "title": "odd",
            "formats": [
                {"ext": "mp4"},
                {"format_id": ""},
                {"format_id": "91", "acodec": "none", "vcodec": "none"}
            ]
        }));
        assert!(resolved.is_empty());
    }
}
