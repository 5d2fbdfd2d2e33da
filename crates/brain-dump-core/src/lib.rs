//! Brain Dump orchestration core.
//!
//! Coordinates the external capture and transcription processes, owns the
//! canonical pipeline state machine, and drives focus-triggered auto-fill.
//! The speech engine, the audio capture library, and the platform
//! accessibility service are external collaborators reached only through
//! the boundaries in [`capture`], [`transcribe`], and [`autofill`].
//!
//! # Example
//!
//! ```no_run
//! use brain_dump_core::{
//!     CaptureSupervisor, JsonlIndex, PipelineMachine, RecordingIndex, RestartPolicy,
//!     TranscriptionCoordinator,
//! };
//!
//! use std::{path::PathBuf, sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (supervisor, capture, capture_events) = CaptureSupervisor::new(
//!         PathBuf::from("brain-dump-recorder"),
//!         Vec::new(),
//!         Duration::from_secs(10),
//!         RestartPolicy::default(),
//!     );
//!     let coordinator = TranscriptionCoordinator::new(
//!         PathBuf::from("brain-dump-transcribe"),
//!         Duration::from_secs(30),
//!         5,
//!     );
//!     let index: Arc<dyn RecordingIndex> =
//!         Arc::new(JsonlIndex::new(PathBuf::from("recordings.jsonl")));
//!     let (machine, pipeline) = PipelineMachine::new(capture, capture_events, coordinator, index);
//!
//!     tokio::spawn(supervisor.run());
//!     tokio::spawn(machine.run());
//!
//!     pipeline.toggle().await.ok();
//! }
//! ```

pub mod autofill;
pub mod capture;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod recording;
pub mod transcribe;

pub use {
    autofill::{
        AccessibilityBridge, AutoFillCoordinator, AutoFillHandle, AutoFillPolicy, FillTrigger,
        FocusDescriptor, SkipReason,
    },
    capture::{CaptureEvent, CaptureHandle, CaptureSupervisor, RestartPolicy, SupervisorStatus},
    error::{CoreError, Result as CoreResult},
    index::{IndexEntry, JsonlIndex, RecordingIndex},
    pipeline::{
        PipelineHandle, PipelineMachine, PipelineState, ResultPayload, ResultStatus, StateChange,
    },
    recording::{
        FIRST_LINE_MAX_LEN, Recording, RecordingInProgress, Transcript, TranscriptStatus,
        first_line,
    },
    transcribe::TranscriptionCoordinator,
};

#[cfg(test)]
mod tests;
