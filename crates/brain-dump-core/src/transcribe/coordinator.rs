//! Transcription coordinator.
//!
//! Converts exactly one audio file into exactly one transcript by spawning
//! the external transcription process. The coordinator holds no mutable
//! state and is reentrant-safe; single-flight is enforced structurally by
//! the pipeline state machine, not defensively here.

use crate::{
    error::{CoreError, Result as CoreResult},
    recording::{Recording, Transcript},
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::{process::Command, time::timeout};
use tracing::{info, instrument, warn};

/// Spawns the external transcription process once per recording.
#[derive(Debug, Clone)]
pub struct TranscriptionCoordinator {
    command: PathBuf,
    min_timeout: Duration,
    timeout_multiplier: u32,
}

impl TranscriptionCoordinator {
    /// Create a coordinator for the given transcriber command.
    ///
    /// `min_timeout` is the deadline floor; takes longer than
    /// `min_timeout / timeout_multiplier` get `duration * timeout_multiplier`
    /// instead.
    pub fn new(command: PathBuf, min_timeout: Duration, timeout_multiplier: u32) -> Self {
        Self {
            command,
            min_timeout,
            timeout_multiplier,
        }
    }

    /// Deadline for a take of the given capture duration.
    pub fn deadline_for(&self, duration: Duration) -> Duration {
        self.min_timeout
            .max(duration.saturating_mul(self.timeout_multiplier))
    }

    /// Convert one audio file into one transcript.
    ///
    /// Spawns the transcriber with the audio path as its sole argument,
    /// waits for exit under a duration-derived deadline, and reads the
    /// artifact the process writes next to the audio file. Failures are
    /// reported, never retried: a failed transcription is terminal for the
    /// recording and the user re-records.
    #[instrument(skip(self, recording), fields(recording_id = %recording.id))]
    pub async fn transcribe(&self, recording: &Recording) -> CoreResult<Transcript> {
        let deadline = self.deadline_for(recording.duration());

        let child = Command::new(&self.command)
            .arg(&recording.audio_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::TranscriptionFailed {
                reason: format!("failed to spawn {:?}: {e}", self.command),
                location: ErrorLocation::from(Location::caller()),
            })?;

        // wait_with_output owns the child; timing out drops the future and
        // kill_on_drop reaps the hung process
        let output = match timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CoreError::TranscriptionFailed {
                    reason: format!("failed to wait for transcriber: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(_) => {
                warn!(
                    waited_ms = deadline.as_millis() as u64,
                    "transcriber exceeded its deadline and was killed"
                );
                return Err(CoreError::TranscriptionTimeout {
                    waited: deadline,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::TranscriptionFailed {
                reason: format!(
                    "transcriber exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let artifact = artifact_path(&recording.audio_path);
        let text = tokio::fs::read_to_string(&artifact).await.map_err(|e| {
            CoreError::TranscriptionFailed {
                reason: format!("transcript artifact missing at {artifact:?}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let text = text.trim().to_string();
        if text.is_empty() {
            warn!("transcriber produced an empty transcript");
        }

        info!(text_len = text.len(), "transcription complete");

        Ok(Transcript::complete(recording.id, text))
    }
}

/// Artifact path the transcriber derives from the audio path
/// (`<audio_path>.txt`, appended, not substituted for the extension).
pub fn artifact_path(audio_path: &Path) -> PathBuf {
    let mut raw = audio_path.as_os_str().to_os_string();
    raw.push(".txt");
    PathBuf::from(raw)
}
