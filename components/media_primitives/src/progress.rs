use serde::{Deserialize, Serialize};

/// A single progress update emitted by a running job.
///
/// Events are transient: consumers render them and drop them. They are
/// delivered over a bounded channel in the order the underlying tool
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A unit of work began: one URL in a fetch queue, or a conversion.
    Started { title: String },

    /// Bytes are arriving from the fetching tool.
    Downloading {
        bytes_done: u64,
        /// Total size, when the tool knows or estimates it.
        bytes_total: Option<u64>,
        /// Bytes per second, when the tool reports it.
        speed: Option<f64>,
        eta_seconds: Option<u64>,
        /// 0.0..=1.0, absent while the total size is unknown.
        fraction: Option<f64>,
    },

    /// The transcoding engine advanced through the input timeline.
    Converting {
        elapsed_seconds: f64,
        /// Probed input duration, absent when the probe failed.
        total_seconds: Option<f64>,
        frame: u64,
        /// Encoding rate relative to realtime (2.5 means 2.5x).
        rate: Option<f64>,
        /// Output bitrate in kbit/s.
        bitrate: Option<f64>,
        /// 0.0..=1.0, absent while the input duration is unknown.
        fraction: Option<f64>,
    },

    /// The job (or queue of jobs) finished successfully.
    Completed,

    /// A unit of work failed; in a queue the remaining units still run.
    Failed { message: String },
}

/// Terminal result of a job, returned by its controller.
///
/// Cancellation is kept distinct from failure so callers can branch
/// without inspecting event messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_their_kind() {
        let json = serde_json::to_string(&ProgressEvent::Completed).unwrap();
        assert_eq!(json, r#"{"kind":"completed"}"#);

        let json = serde_json::to_string(&ProgressEvent::Started {
            title: "Some Clip".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"started","title":"Some Clip"}"#);
    }

    #[test]
    fn downloading_event_round_trips() {
        let event = ProgressEvent::Downloading {
            bytes_done: 512,
            bytes_total: Some(1024),
            speed: Some(2048.0),
            eta_seconds: Some(4),
            fraction: Some(0.5),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn outcome_distinguishes_cancellation_from_failure() {
        assert_ne!(
            JobOutcome::Cancelled,
            JobOutcome::Failed("cancelled by user".to_string())
        );
    }
}
