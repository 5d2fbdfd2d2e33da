//! Recording lifecycle and transcript data model.
//!
//! A capture take starts life as a [`RecordingInProgress`] when the capture
//! process confirms recording, and becomes an immutable [`Recording`] once
//! the saved audio path is reported. The id is assigned at capture-stop.

use std::{
    path::PathBuf,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of the first-line summary stored in the recording index.
pub const FIRST_LINE_MAX_LEN: usize = 50;

/// A capture that has started but not yet produced an audio file.
#[derive(Debug, Clone, Copy)]
pub struct RecordingInProgress {
    started_at: Instant,
    recorded_at: SystemTime,
}

impl RecordingInProgress {
    /// Mark the start of a capture.
    pub fn begin() -> Self {
        Self {
            started_at: Instant::now(),
            recorded_at: SystemTime::now(),
        }
    }

    /// Finalize with the audio path reported by the capture process.
    ///
    /// Assigns the recording id; the result is immutable from here on.
    pub fn finish(self, audio_path: PathBuf) -> Recording {
        Recording {
            id: Uuid::new_v4(),
            audio_path,
            started_at: self.started_at,
            stopped_at: Instant::now(),
            recorded_at: self.recorded_at,
        }
    }
}

/// One captured audio take, finalized at capture-stop time.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Unique identifier, assigned when the capture stopped.
    pub id: Uuid,
    /// Path to the captured audio. The file is owned by the capture
    /// process and read-only to the rest of the system.
    pub audio_path: PathBuf,
    started_at: Instant,
    stopped_at: Instant,
    recorded_at: SystemTime,
}

impl Recording {
    /// Capture length, measured on the monotonic clock.
    pub fn duration(&self) -> Duration {
        self.stopped_at.duration_since(self.started_at)
    }

    /// Wall-clock capture start as epoch milliseconds, for index entries.
    pub fn recorded_at_ms(&self) -> u64 {
        self.recorded_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Outcome of a transcription, mutated exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TranscriptStatus {
    /// Transcription requested; the external process is still running.
    #[default]
    Pending,
    /// Transcript text was read from the process artifact.
    Complete,
    /// The external process failed; the take must be re-recorded.
    Failed,
}

/// Text derived from exactly one [`Recording`].
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Back-reference (not ownership) to the source recording.
    pub recording_id: Uuid,
    /// Full transcript content; empty unless `status` is `Complete`.
    pub text: String,
    /// Lifecycle status.
    pub status: TranscriptStatus,
}

impl Transcript {
    /// A transcript that completed with `text`.
    pub fn complete(recording_id: Uuid, text: String) -> Self {
        Self {
            recording_id,
            text,
            status: TranscriptStatus::Complete,
        }
    }

    /// A transcript whose external process failed.
    pub fn failed(recording_id: Uuid) -> Self {
        Self {
            recording_id,
            text: String::new(),
            status: TranscriptStatus::Failed,
        }
    }
}

/// First line of `text`, trimmed to `max_len` characters with `...`
/// appended when truncated. Used for index rows and notifications.
pub fn first_line(text: &str, max_len: usize) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > max_len {
        let truncated: String = line.chars().take(max_len).collect();
        format!("{truncated}...")
    } else {
        line.to_string()
    }
}
