//! History of generated reports, persisted as a newest-first JSON array.
//!
//! The backing file is read in full on every load and rewritten in full on
//! every append. There is no locking: concurrent writers race and the last
//! rewrite wins.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::HistoryError;
use crate::persistence;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 20;

/// Timestamp format stored in the `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One past report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub topic: String,
    #[serde(rename = "date")]
    pub timestamp: String,
    #[serde(rename = "path")]
    pub file_path: String,
}

/// Bounded, newest-first store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read all entries. A missing or unparsable file yields an empty list.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Could not read history");
                }
                return Vec::new();
            }
        };
        match serde_json::from_str(&data) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed history");
                Vec::new()
            }
        }
    }

    /// Record a finished report, stamped with the current local time.
    ///
    /// Returns `Ok(false)` when the entry duplicates the current head and
    /// nothing was written.
    pub fn append(&self, topic: &str, file_path: &str) -> Result<bool, HistoryError> {
        let timestamp = Local::now().format(DATE_FORMAT).to_string();
        self.append_entry(HistoryEntry {
            topic: topic.to_string(),
            timestamp,
            file_path: file_path.to_string(),
        })
    }

    /// Insert `entry` at the front, evicting the oldest entries past capacity.
    ///
    /// Only the head is checked for duplicates; an older identical entry is
    /// kept alongside the new one.
    pub fn append_entry(&self, entry: HistoryEntry) -> Result<bool, HistoryError> {
        let mut entries = self.load();
        if let Some(head) = entries.first() {
            if head.topic == entry.topic && head.file_path == entry.file_path {
                debug!(topic = %entry.topic, "History head already records this report");
                return Ok(false);
            }
        }

        entries.insert(0, entry);
        entries.truncate(self.capacity);

        persistence::write_json_replacing(&self.path, &entries).map_err(|source| {
            HistoryError::Persist {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(true)
    }
}
