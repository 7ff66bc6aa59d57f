use media_primitives::MediaKind;
use std::path::PathBuf;

/// A queue of URLs to fetch with one shared format selection.
///
/// URLs are processed strictly in order; a failing URL never
/// invalidates the rest of the queue.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub urls: Vec<String>,
    pub output_dir: PathBuf,
    /// Tool-facing format selector, possibly a `"<video>+<audio>"`
    /// pair from the resolver.
    pub format_id: String,
    pub kind: MediaKind,
}

impl FetchRequest {
    /// The selector handed to the fetching tool. An audio fetch always
    /// takes the best available audio stream; a video fetch uses the
    /// chosen format id.
    pub fn format_selector(&self) -> &str {
        match self.kind {
            MediaKind::Audio => "bestaudio/best",
            MediaKind::Video => &self.format_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: MediaKind) -> FetchRequest {
        FetchRequest {
            urls: vec!["https://example.com/watch?v=1".to_string()],
            output_dir: PathBuf::from("/downloads"),
            format_id: "best".to_string(),
            kind,
        }
    }

    #[test]
    fn audio_requests_select_the_best_audio_stream() {
        assert_eq!(request(MediaKind::Audio).format_selector(), "bestaudio/best");
    }

    #[test]
    fn video_requests_keep_the_chosen_format() {
        let mut fetch = request(MediaKind::Video);
        fetch.format_id = "137+251".to_string();
        assert_eq!(fetch.format_selector(), "137+251");
    }
}
