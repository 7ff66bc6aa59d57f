//! Persisted history of finished downloads.
//!
//! A plain JSON file holding the most recent entries, oldest first on
//! disk. A corrupt or missing file reads as empty and is rewritten on
//! the next record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_fetcher::CompletionLog;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Only the most recent entries are kept.
const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub date: DateTime<Utc>,
}

pub struct HistoryStore {
    path: PathBuf,
    // Serializes the read-modify-write cycle within this process.
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Entries newest first. A missing or corrupt file reads as empty.
    pub fn list(&self) -> Vec<HistoryEntry> {
        let mut entries = self.read_entries();
        entries.reverse();
        entries
    }

    /// Append one entry, dropping the oldest past the limit.
    pub fn record(&self, name: &str) -> io::Result<()> {
        let _guard = self.write_lock.lock();

        let mut entries = self.read_entries();
        entries.push(HistoryEntry {
            name: name.to_string(),
            date: Utc::now(),
        });
        if entries.len() > HISTORY_LIMIT {
            let excess = entries.len() - HISTORY_LIMIT;
            entries.drain(..excess);
        }

        let raw = serde_json::to_string_pretty(&entries).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }

    fn read_entries(&self) -> Vec<HistoryEntry> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(%error, path = %self.path.display(), "unreadable history file, starting fresh");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl CompletionLog for HistoryStore {
    async fn record_completion(&self, title: &str) -> io::Result<()> {
        self.record(title)
    }
}
