//! Desktop-notification overlay.
//!
//! Renders transcription results and pipeline errors as transient desktop
//! notifications; the auto-dismiss timeout plays the floating overlay's
//! auto-hide role. Strictly best-effort: a failed notification is logged
//! and forgotten.

use brain_dump_core::{FIRST_LINE_MAX_LEN, PipelineState, ResultStatus, StateChange, first_line};
use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

/// How long a result notification stays on screen before auto-hiding.
const RESULT_TIMEOUT_MS: u32 = 4_000;

/// Overlay adapter fed from the pipeline's state broadcast.
pub struct OverlayNotifier;

impl OverlayNotifier {
    /// Create the notifier.
    pub fn new() -> Self {
        Self
    }

    /// Surface one state change to the user.
    pub fn notify(&self, change: &StateChange) {
        let Some(payload) = &change.payload else {
            return;
        };

        match payload.status {
            ResultStatus::Complete => {
                let text = payload.text.as_deref().unwrap_or_default();
                show("Transcript ready", &first_line(text, FIRST_LINE_MAX_LEN));
            }
            ResultStatus::Error => {
                if let PipelineState::Error(reason) = &change.state {
                    show("Brain Dump error", reason);
                }
            }
            // the tray indicator already shows the transcribing state
            ResultStatus::Transcribing => {}
        }
    }
}

impl Default for OverlayNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn show(summary: &str, body: &str) {
    match Notification::new()
        .summary(summary)
        .body(body)
        .timeout(Timeout::Milliseconds(RESULT_TIMEOUT_MS))
        .show()
    {
        Ok(_) => debug!(summary, "notification shown"),
        Err(e) => warn!(error = %e, "notification failed"),
    }
}
