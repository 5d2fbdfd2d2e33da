use brain_dump_core::PipelineState;

/// Tray icon states corresponding to the pipeline workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Currently recording audio.
    Recording,
    /// Transcribing the finished take.
    Processing,
    /// A collaborator failed; cleared by the next toggle.
    Error,
}

impl From<&PipelineState> for TrayIconState {
    fn from(state: &PipelineState) -> Self {
        match state {
            PipelineState::Idle => TrayIconState::Idle,
            PipelineState::Recording => TrayIconState::Recording,
            PipelineState::Processing => TrayIconState::Processing,
            PipelineState::Error(_) => TrayIconState::Error,
        }
    }
}
