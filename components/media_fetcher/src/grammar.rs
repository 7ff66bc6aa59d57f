use media_primitives::ProgressEvent;
use serde::Deserialize;

/// One progress record from the fetching tool's
/// `--progress-template download:%(progress)j` output.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchProgress {
    pub status: FetchStatus,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    /// Bytes per second.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Seconds remaining.
    #[serde(default)]
    pub eta: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Downloading,
    Finished,
    Error,
}

/// Parse one output line; anything that is not a well-formed progress
/// record yields `None` and is skipped by the controller.
pub fn parse_progress_line(line: &str) -> Option<FetchProgress> {
    let payload = line.trim().strip_prefix("download:")?;
    serde_json::from_str(payload).ok()
}

impl FetchProgress {
    /// The event to forward, or `None` for records the controller
    /// handles through the process exit instead.
    pub fn to_event(&self) -> Option<ProgressEvent> {
        match self.status {
            FetchStatus::Downloading => {
                let bytes_done = self.downloaded_bytes.unwrap_or(0.0);
                let total = self
                    .total_bytes
                    .or(self.total_bytes_estimate)
                    .filter(|total| *total > 0.0);
                let fraction = total.map(|total| (bytes_done / total).min(1.0));
                Some(ProgressEvent::Downloading {
                    bytes_done: bytes_done as u64,
                    bytes_total: total.map(|total| total as u64),
                    speed: self.speed,
                    eta_seconds: self.eta.map(|eta| eta as u64),
                    fraction,
                })
            }
            FetchStatus::Finished | FetchStatus::Error => None,
        }
    }
}
