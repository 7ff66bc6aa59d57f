// bases/media_cli/src/args.rs
use clap::{Parser, Subcommand};
use media_primitives::{MediaKind, QualityTier};
use std::path::PathBuf;

/// Fetch and transcode media with live progress
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transcode a local media file
    Convert {
        /// Input media file
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// Target container or audio codec (mp4, webm, mkv, avi, mp3, ...)
        #[arg(short, long)]
        format: String,

        /// Quality tier: highest, high, medium or low
        #[arg(short, long, default_value = "medium")]
        quality: QualityTier,
    },

    /// Download one or more URLs, in order
    Fetch {
        /// URLs to download
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory to store downloaded files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Format id from `formats`, or a tool selector like "best"
        #[arg(short, long, default_value = "best")]
        format: String,

        /// What to fetch: video or audio
        #[arg(short, long, default_value = "video")]
        kind: MediaKind,
    },

    /// List the formats a URL offers
    Formats {
        /// URL to inspect
        url: String,
    },

    /// Show recent download history
    History,
}
