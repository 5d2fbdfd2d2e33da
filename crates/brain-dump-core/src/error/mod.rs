use std::{panic::Location, result::Result as StdResult, time::Duration};

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors produced by the orchestration core.
///
/// All variants include `ErrorLocation` for call-site tracking. Collaborator
/// failures are normalized here; nothing outside the core ever sees a raw
/// process exit code.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Capture process could not be spawned or never reported READY.
    #[error("Capture startup failed: {reason} {location}")]
    CaptureStartupFailure {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Capture process exited without being asked to.
    #[error("Capture process crashed: {reason} {location}")]
    CaptureCrashed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Transcription process failed or produced no artifact.
    #[error("Transcription failed: {reason} {location}")]
    TranscriptionFailed {
        /// Human-readable reason, including captured stderr when available.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Transcription process exceeded its deadline and was killed.
    #[error("Transcription timed out after {waited:?} {location}")]
    TranscriptionTimeout {
        /// How long the coordinator waited before killing the process.
        waited: Duration,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// An internal channel closed while its peer task was still needed.
    #[error("Channel closed: {message} {location}")]
    ChannelClosed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Recording index read or write failed.
    #[error("Index error: {reason} {location}")]
    Index {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Short human-readable reason suitable for the UI.
    ///
    /// The full `Display` output carries diagnostics and call sites; this is
    /// what the tray tooltip and the overlay show.
    pub fn user_reason(&self) -> String {
        match self {
            CoreError::CaptureStartupFailure { .. } => "capture failed to start".to_string(),
            CoreError::CaptureCrashed { .. } => "capture process crashed".to_string(),
            CoreError::TranscriptionFailed { .. } => "transcription failed".to_string(),
            CoreError::TranscriptionTimeout { .. } => "transcription timed out".to_string(),
            CoreError::ChannelClosed { .. } => "capture service unavailable".to_string(),
            CoreError::Index { .. } => "recording index unavailable".to_string(),
            CoreError::Io { .. } => "file system error".to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using [`CoreError`].
pub type Result<T> = StdResult<T, CoreError>;
