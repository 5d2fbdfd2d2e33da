//! Per-recording transcription coordination.

mod coordinator;

pub use coordinator::{TranscriptionCoordinator, artifact_path};
