//! Line protocol spoken by the capture process.
//!
//! The recorder emits newline-delimited tokens on stdout:
//!
//! - `READY` — process initialized, listening for commands.
//! - `RECORDING_STARTED` — capture active.
//! - `RECORDING_STOPPED:<path>` — capture saved; payload is the audio path.
//! - `ERROR:<kind>` — an operation failed, the process keeps running.
//!
//! Anything else is diagnostic noise: it never faults the protocol, but the
//! supervisor still forwards it to the logs.

use std::path::PathBuf;

/// One parsed protocol line from the capture process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Process initialized and listening for commands.
    Ready,
    /// Capture is active.
    Started,
    /// Capture finished and the audio file was written.
    Stopped {
        /// Path reported by the recorder.
        path: PathBuf,
    },
    /// The recorder reported an operation failure and kept running.
    Fault {
        /// Error kind token, e.g. `RecordingStartFailed`.
        kind: String,
    },
}

/// Parse one stdout line.
///
/// Returns `None` for diagnostic noise. The payload of `RECORDING_STOPPED`
/// starts after the first colon; colons inside the path itself survive.
pub fn parse_line(line: &str) -> Option<ProtocolEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line {
        "READY" => Some(ProtocolEvent::Ready),
        "RECORDING_STARTED" => Some(ProtocolEvent::Started),
        _ => {
            if let Some(path) = line.strip_prefix("RECORDING_STOPPED:") {
                Some(ProtocolEvent::Stopped {
                    path: PathBuf::from(path),
                })
            } else if let Some(kind) = line.strip_prefix("ERROR:") {
                Some(ProtocolEvent::Fault {
                    kind: kind.to_string(),
                })
            } else {
                None
            }
        }
    }
}
