//! The pipeline state machine.
//!
//! Consumes events from the capture supervisor and results from the
//! transcription coordinator, owns the canonical [`PipelineState`], and
//! fans state changes out to UI adapters and the auto-fill coordinator.
//!
//! `toggle()` is the only externally callable mutator — "do the opposite of
//! what I'm doing now" — so the hotkey layer can never request an invalid
//! transition. Every other transition is driven by collaborator events. A
//! toggle is always evaluated against the state as of its own arrival: the
//! select loop stays responsive while a transcription is in flight because
//! the join handle is polled as one of its arms rather than awaited inline.

use crate::{
    capture::{CaptureEvent, CaptureHandle},
    error::{CoreError, Result as CoreResult},
    index::{IndexEntry, RecordingIndex},
    pipeline::state::{PipelineState, ResultPayload, ResultStatus, StateChange},
    recording::{Recording, RecordingInProgress, Transcript},
    transcribe::TranscriptionCoordinator,
};

use std::{panic::Location, path::PathBuf, sync::Arc};

use error_location::ErrorLocation;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

/// Commands accepted by the machine task.
#[derive(Debug, Clone, Copy)]
enum PipelineCommand {
    Toggle,
    Shutdown,
}

/// A transcription currently in flight, with the recording it belongs to.
struct InflightTranscription {
    recording: Recording,
    handle: JoinHandle<CoreResult<Transcript>>,
}

/// Cloneable surface for driving and observing the state machine.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    command_tx: mpsc::Sender<PipelineCommand>,
    updates_tx: broadcast::Sender<StateChange>,
    transcript_rx: watch::Receiver<Option<String>>,
}

impl PipelineHandle {
    /// Do the opposite of whatever the pipeline is doing right now.
    ///
    /// Total over all states: starts a capture from `Idle` or `Error`,
    /// stops it from `Recording`, and is ignored during `Processing`.
    pub async fn toggle(&self) -> CoreResult<()> {
        self.command_tx
            .send(PipelineCommand::Toggle)
            .await
            .map_err(|_| CoreError::ChannelClosed {
                message: "pipeline machine is gone".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Ask the machine (and with it the capture process) to shut down.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(PipelineCommand::Shutdown).await;
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.updates_tx.subscribe()
    }

    /// Latest-transcript cell: written once per completed cycle by the
    /// machine, read by any number of consumers.
    pub fn latest_transcript(&self) -> watch::Receiver<Option<String>> {
        self.transcript_rx.clone()
    }
}

/// The pipeline state machine task.
pub struct PipelineMachine {
    state: PipelineState,
    capture: CaptureHandle,
    coordinator: TranscriptionCoordinator,
    index: Arc<dyn RecordingIndex>,
    command_rx: mpsc::Receiver<PipelineCommand>,
    capture_events: mpsc::Receiver<CaptureEvent>,
    updates_tx: broadcast::Sender<StateChange>,
    transcript_tx: watch::Sender<Option<String>>,
    in_progress: Option<RecordingInProgress>,
    inflight: Option<InflightTranscription>,
}

impl PipelineMachine {
    /// Create the machine and its handle.
    ///
    /// `capture`/`capture_events` come from [`crate::CaptureSupervisor::new`];
    /// the index append is a side effect and its failures never become
    /// pipeline errors.
    pub fn new(
        capture: CaptureHandle,
        capture_events: mpsc::Receiver<CaptureEvent>,
        coordinator: TranscriptionCoordinator,
        index: Arc<dyn RecordingIndex>,
    ) -> (Self, PipelineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (updates_tx, _) = broadcast::channel(32);
        let (transcript_tx, transcript_rx) = watch::channel(None);

        let machine = Self {
            state: PipelineState::Idle,
            capture,
            coordinator,
            index,
            command_rx,
            capture_events,
            updates_tx: updates_tx.clone(),
            transcript_tx,
            in_progress: None,
            inflight: None,
        };

        let handle = PipelineHandle {
            command_tx,
            updates_tx,
            transcript_rx,
        };

        (machine, handle)
    }

    /// Run the machine until shutdown.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("pipeline state machine running");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(PipelineCommand::Toggle) => self.handle_toggle().await,
                    Some(PipelineCommand::Shutdown) | None => break,
                },
                Some(event) = self.capture_events.recv() => {
                    self.handle_capture_event(event).await;
                }
                done = join_inflight(&mut self.inflight) => {
                    self.inflight = None;
                    self.handle_transcription_done(done);
                }
            }
        }

        if let Err(e) = self.capture.shutdown().await {
            debug!(error = %e, "capture supervisor already gone at shutdown");
        }
        info!("pipeline state machine stopped");
    }

    async fn handle_toggle(&mut self) {
        match self.state {
            PipelineState::Idle | PipelineState::Error(_) => match self.capture.start_capture().await {
                Ok(()) => self.transition(PipelineState::Recording, None),
                Err(e) => {
                    error!(error = %e, "could not issue start to the capture process");
                    self.fail(e.user_reason());
                }
            },
            PipelineState::Recording => match self.capture.stop_capture().await {
                Ok(()) => self.transition(
                    PipelineState::Processing,
                    Some(ResultPayload {
                        status: ResultStatus::Transcribing,
                        text: None,
                    }),
                ),
                Err(e) => {
                    error!(error = %e, "could not issue stop to the capture process");
                    self.fail(e.user_reason());
                }
            },
            PipelineState::Processing => {
                // Mid-transcription toggles are dropped: local transcription
                // of a dictation-length take resolves in well under a second,
                // and re-arming here would surprise more than it helps.
                debug!("toggle ignored while transcribing");
            }
        }
    }

    async fn handle_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Started => {
                if self.state == PipelineState::Recording {
                    self.in_progress = Some(RecordingInProgress::begin());
                    debug!("capture confirmed started");
                } else {
                    warn!(state = self.state.label(), "unexpected RECORDING_STARTED");
                }
            }
            CaptureEvent::Stopped { audio_path } => self.on_capture_stopped(audio_path),
            CaptureEvent::Error { reason, fatal } => self.on_capture_error(reason, fatal),
        }
    }

    fn on_capture_stopped(&mut self, audio_path: PathBuf) {
        if self.state != PipelineState::Processing {
            warn!(
                state = self.state.label(),
                path = ?audio_path,
                "capture stopped without a stop request"
            );
            return;
        }

        let in_progress = self.in_progress.take().unwrap_or_else(|| {
            // stop raced ahead of the start confirmation: a double-press of
            // the hotkey produces a take of near-zero duration
            warn!("stop arrived before the start confirmation");
            RecordingInProgress::begin()
        });

        let recording = in_progress.finish(audio_path);
        info!(
            recording_id = %recording.id,
            duration_ms = recording.duration().as_millis() as u64,
            path = ?recording.audio_path,
            "capture finished, transcribing"
        );

        let coordinator = self.coordinator.clone();
        let subject = recording.clone();
        let handle = tokio::spawn(async move { coordinator.transcribe(&subject).await });
        self.inflight = Some(InflightTranscription { recording, handle });
    }

    fn on_capture_error(&mut self, reason: String, fatal: bool) {
        match self.state {
            PipelineState::Recording => {
                self.in_progress = None;
                self.fail(reason);
            }
            PipelineState::Processing if self.inflight.is_none() => {
                // still waiting for the stopped-path; this cycle is lost
                self.fail(reason);
            }
            PipelineState::Processing => {
                // the transcriber already has the file; the capture process
                // is the supervisor's problem from here
                warn!(reason = %reason, fatal, "capture error ignored, transcription in flight");
            }
            PipelineState::Idle | PipelineState::Error(_) => {
                warn!(reason = %reason, fatal, "capture error while idle");
            }
        }
    }

    fn handle_transcription_done(&mut self, done: (Recording, CoreResult<Transcript>)) {
        let (recording, result) = done;
        match result {
            Ok(transcript) => {
                let text = transcript.text.clone();
                self.persist(&recording, &transcript);
                if self.transcript_tx.send(Some(text.clone())).is_err() {
                    debug!("no latest-transcript readers");
                }
                self.transition(
                    PipelineState::Idle,
                    Some(ResultPayload {
                        status: ResultStatus::Complete,
                        text: Some(text),
                    }),
                );
            }
            Err(e) => {
                warn!(error = %e, recording_id = %recording.id, "transcription failed");
                self.persist(&recording, &Transcript::failed(recording.id));
                self.fail(e.user_reason());
            }
        }
    }

    /// Append the finished cycle to the recording index. Failures are
    /// logged; the index is a side-effect sink, never a pipeline gate.
    fn persist(&self, recording: &Recording, transcript: &Transcript) {
        let entry = IndexEntry::from_parts(recording, transcript);
        if let Err(e) = self.index.append(&entry) {
            error!(error = %e, recording_id = %recording.id, "failed to append index entry");
        }
    }

    fn fail(&mut self, reason: String) {
        self.transition(
            PipelineState::Error(reason),
            Some(ResultPayload {
                status: ResultStatus::Error,
                text: None,
            }),
        );
    }

    fn transition(&mut self, next: PipelineState, payload: Option<ResultPayload>) {
        if self.state != next {
            info!(from = self.state.label(), to = next.label(), "pipeline transition");
        }
        self.state = next.clone();
        if self.updates_tx.send(StateChange { state: next, payload }).is_err() {
            debug!("no state-change subscribers");
        }
    }
}

/// Await the in-flight transcription when one exists; pends forever when
/// nothing is in flight, so the select arm simply never fires.
async fn join_inflight(
    inflight: &mut Option<InflightTranscription>,
) -> (Recording, CoreResult<Transcript>) {
    match inflight {
        Some(entry) => {
            let result = match (&mut entry.handle).await {
                Ok(result) => result,
                Err(e) => Err(CoreError::TranscriptionFailed {
                    reason: format!("transcription task failed: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                }),
            };
            (entry.recording.clone(), result)
        }
        None => std::future::pending().await,
    }
}
