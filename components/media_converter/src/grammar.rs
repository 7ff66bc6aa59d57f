use media_primitives::ProgressEvent;
use regex::Regex;

/// Parsed fields from one engine stats line.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub rate: Option<f64>,
    pub bitrate: Option<f64>,
}

/// Patterns for the transcoding engine's fixed-layout output lines.
pub struct TranscodeGrammar {
    duration: Regex,
    frame: Regex,
    time: Regex,
    speed: Regex,
    bitrate: Regex,
}

impl TranscodeGrammar {
    pub fn new() -> Self {
        Self {
            duration: Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})")
                .expect("duration pattern compiles"),
            frame: Regex::new(r"frame=\s*(\d+)").expect("frame pattern compiles"),
            time: Regex::new(r"time=\s*(\d+):(\d+):(\d+)\.(\d+)").expect("time pattern compiles"),
            speed: Regex::new(r"speed=\s*(\d+\.?\d*)x").expect("speed pattern compiles"),
            bitrate: Regex::new(r"bitrate=\s*(\d+\.?\d*)").expect("bitrate pattern compiles"),
        }
    }

    /// Input duration in seconds from a probe banner line, e.g.
    /// `Duration: 00:01:30.50, start: 0.000000` parses to 90.5.
    pub fn parse_duration(&self, line: &str) -> Option<f64> {
        let captures = self.duration.captures(line)?;
        let hours: f64 = captures[1].parse().ok()?;
        let minutes: f64 = captures[2].parse().ok()?;
        let seconds: f64 = captures[3].parse().ok()?;
        let centiseconds: f64 = captures[4].parse().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds + centiseconds / 100.0)
    }

    /// A progress line starts with `frame=` and must carry both a frame
    /// count and a timestamp; anything else is not a progress line.
    pub fn parse_frame_line(&self, line: &str) -> Option<FrameUpdate> {
        if !line.starts_with("frame=") {
            return None;
        }

        let frame = self
            .frame
            .captures(line)
            .and_then(|c| c[1].parse().ok())?;

        let time = self.time.captures(line)?;
        let hours: f64 = time[1].parse().ok()?;
        let minutes: f64 = time[2].parse().ok()?;
        let seconds: f64 = time[3].parse().ok()?;
        let centiseconds: f64 = time[4].parse().ok()?;
        let elapsed_seconds = hours * 3600.0 + minutes * 60.0 + seconds + centiseconds / 100.0;

        let rate = self
            .speed
            .captures(line)
            .and_then(|c| c[1].parse().ok());
        let bitrate = self
            .bitrate
            .captures(line)
            .and_then(|c| c[1].parse().ok());

        Some(FrameUpdate {
            frame,
            elapsed_seconds,
            rate,
            bitrate,
        })
    }
}

impl Default for TranscodeGrammar {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns frame updates into events, forwarding at most one per 100 ms
/// of media time and keeping the reported fraction monotone.
pub struct ProgressThrottle {
    total_seconds: Option<f64>,
    last_forwarded_ms: Option<u64>,
    best_fraction: f64,
    last_frame: u64,
}

impl ProgressThrottle {
    const INTERVAL_MS: u64 = 100;

    pub fn new(total_seconds: Option<f64>) -> Self {
        Self {
            total_seconds,
            last_forwarded_ms: None,
            best_fraction: 0.0,
            last_frame: 0,
        }
    }

    /// The event to forward for this update, or `None` when it falls
    /// inside the throttle window.
    pub fn admit(&mut self, update: &FrameUpdate) -> Option<ProgressEvent> {
        self.last_frame = update.frame;

        let elapsed_ms = (update.elapsed_seconds * 1000.0) as u64;
        if let Some(last) = self.last_forwarded_ms {
            if elapsed_ms < last + Self::INTERVAL_MS {
                return None;
            }
        }
        self.last_forwarded_ms = Some(elapsed_ms);

        let fraction = self.total_seconds.map(|total| {
            self.best_fraction = self
                .best_fraction
                .max((update.elapsed_seconds / total).min(1.0));
            self.best_fraction
        });

        Some(ProgressEvent::Converting {
            elapsed_seconds: update.elapsed_seconds,
            total_seconds: self.total_seconds,
            frame: update.frame,
            rate: update.rate,
            bitrate: update.bitrate,
            fraction,
        })
    }

    /// Closing event for a successful run; the fraction is pinned to
    /// exactly 1.0 regardless of what the last stats line said.
    pub fn finish(&self) -> ProgressEvent {
        ProgressEvent::Converting {
            elapsed_seconds: self.total_seconds.unwrap_or(0.0),
            total_seconds: self.total_seconds,
            frame: self.last_frame,
            rate: None,
            bitrate: None,
            fraction: Some(1.0),
        }
    }
}
