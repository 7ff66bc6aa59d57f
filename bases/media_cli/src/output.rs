// bases/media_cli/src/output.rs
use download_history::HistoryEntry;
use media_fetcher::ResolvedFormats;
use media_primitives::ProgressEvent;

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { title } => {
                println!("Starting: {title}");
            }
            ProgressEvent::Downloading {
                bytes_done,
                bytes_total,
                speed,
                eta_seconds,
                fraction,
            } => {
                let percent = fraction
                    .map(|f| format!("{:5.1}%", f * 100.0))
                    .unwrap_or_else(|| "    ?%".to_string());
                let size = match bytes_total {
                    Some(total) => format!("{} / {}", format_size(*bytes_done), format_size(*total)),
                    None => format_size(*bytes_done),
                };
                let speed = speed
                    .map(|s| format!(" at {}/s", format_size(s as u64)))
                    .unwrap_or_default();
                let eta = eta_seconds
                    .map(|e| format!(", {} left", format_eta(e)))
                    .unwrap_or_default();
                println!("{percent}  {size}{speed}{eta}");
            }
            ProgressEvent::Converting {
                elapsed_seconds,
                total_seconds,
                frame,
                rate,
                fraction,
                ..
            } => {
                let percent = fraction
                    .map(|f| format!("{:5.1}%", f * 100.0))
                    .unwrap_or_else(|| "    ?%".to_string());
                let position = match total_seconds {
                    Some(total) => format!("{:.1}s / {:.1}s", elapsed_seconds, total),
                    None => format!("{:.1}s", elapsed_seconds),
                };
                let rate = rate.map(|r| format!(" at {r}x")).unwrap_or_default();
                if self.verbose {
                    println!("{percent}  {position}{rate} (frame {frame})");
                } else {
                    println!("{percent}  {position}{rate}");
                }
            }
            ProgressEvent::Completed => {
                println!("Done.");
            }
            ProgressEvent::Failed { message } => {
                eprintln!("Failed: {message}");
            }
        }
    }

    pub fn print_cancelled(&self) {
        println!("Cancelled.");
    }

    pub fn print_formats(&self, resolved: &ResolvedFormats) {
        if resolved.is_empty() {
            println!("No formats available.");
            return;
        }

        println!("Formats for: {}", resolved.title);
        if !resolved.video.is_empty() {
            println!("\nVideo:");
            for format in &resolved.video {
                println!("  {}", format.label);
            }
        }
        if !resolved.audio.is_empty() {
            println!("\nAudio:");
            for format in &resolved.audio {
                println!("  {}", format.label);
            }
        }
    }

    pub fn print_history(&self, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            println!("No downloads yet.");
            return;
        }
        for entry in entries {
            println!("{} - {}", entry.name, entry.date.format("%Y-%m-%d %H:%M:%S"));
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1}GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.1}KB", bytes / KB)
    } else {
        format!("{bytes:.0}B")
    }
}

fn format_eta(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
