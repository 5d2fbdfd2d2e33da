//! Recording index boundary and the JSON-lines implementation.
//!
//! The index is a side-effect sink for finished cycles: the pipeline
//! machine appends one entry per transcription (complete or failed), and
//! list/search/get-by-id serve the history views. Failures here never gate
//! the pipeline.

use crate::{
    error::{CoreError, Result as CoreResult},
    recording::{FIRST_LINE_MAX_LEN, Recording, Transcript, TranscriptStatus, first_line},
};

use std::{
    fs::{self, OpenOptions},
    io::Write,
    panic::Location,
    path::PathBuf,
};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One persisted recording row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Recording id.
    pub id: Uuid,
    /// Capture start, epoch milliseconds.
    pub recorded_at_ms: u64,
    /// Capture length in seconds, rounded.
    pub duration_secs: u64,
    /// Audio file path reported by the capture process.
    pub audio_path: PathBuf,
    /// Transcript summary line for list views.
    pub first_line: String,
    /// Full transcript text; empty when transcription failed.
    pub transcript: String,
    /// Outcome of the transcription.
    pub status: TranscriptStatus,
}

impl IndexEntry {
    /// Build the row for a finished cycle.
    pub fn from_parts(recording: &Recording, transcript: &Transcript) -> Self {
        Self {
            id: recording.id,
            recorded_at_ms: recording.recorded_at_ms(),
            duration_secs: recording.duration().as_secs_f64().round() as u64,
            audio_path: recording.audio_path.clone(),
            first_line: first_line(&transcript.text, FIRST_LINE_MAX_LEN),
            transcript: transcript.text.clone(),
            status: transcript.status,
        }
    }
}

/// Append/query surface of the on-disk recording index.
pub trait RecordingIndex: Send + Sync {
    /// Append one entry.
    fn append(&self, entry: &IndexEntry) -> CoreResult<()>;

    /// All entries, newest first.
    fn list(&self) -> CoreResult<Vec<IndexEntry>>;

    /// Entries whose transcript or summary contains `query`,
    /// case-insensitively, newest first.
    fn search(&self, query: &str) -> CoreResult<Vec<IndexEntry>>;

    /// The entry with the given id, if present.
    fn get_by_id(&self, id: Uuid) -> CoreResult<Option<IndexEntry>>;
}

/// JSON-lines file-backed index, one entry per line, append-only.
#[derive(Debug, Clone)]
pub struct JsonlIndex {
    path: PathBuf,
}

impl JsonlIndex {
    /// Index backed by the file at `path`; created lazily on first append.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// All entries in file (oldest-first) order.
    fn read_all(&self) -> CoreResult<Vec<IndexEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<IndexEntry>(line) {
                Ok(entry) => entries.push(entry),
                // a torn write must not poison the whole index
                Err(e) => warn!(line = number + 1, error = %e, "skipping corrupt index line"),
            }
        }
        Ok(entries)
    }
}

impl RecordingIndex for JsonlIndex {
    fn append(&self, entry: &IndexEntry) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = serde_json::to_string(entry).map_err(|e| CoreError::Index {
            reason: format!("failed to serialize index entry: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<IndexEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        Ok(entries)
    }

    fn search(&self, query: &str) -> CoreResult<Vec<IndexEntry>> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| {
                entry.transcript.to_lowercase().contains(&needle)
                    || entry.first_line.to_lowercase().contains(&needle)
            })
            .collect())
    }

    fn get_by_id(&self, id: Uuid) -> CoreResult<Option<IndexEntry>> {
        Ok(self.read_all()?.into_iter().find(|entry| entry.id == id))
    }
}
