//! Auto-fill coordinator.
//!
//! Watches focus-change events and injects the latest transcript into the
//! newly focused element — but only under policy. Injection is best-effort:
//! a rejected injection is logged and swallowed, never escalated to the
//! pipeline, and still advances the debounce window so rejecting targets
//! are not hammered.

use crate::autofill::policy::{AutoFillPolicy, FocusDescriptor};

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};
use tracing::{debug, info, instrument, warn};

/// Boundary to the platform accessibility service's injection surface.
///
/// The service itself is an external collaborator; the core only consumes
/// these operations.
#[async_trait]
pub trait AccessibilityBridge: Send {
    /// Whether the platform currently grants injection access.
    fn has_permission(&self) -> bool;

    /// Prompt for access; returns the resulting permission state.
    fn request_permission(&mut self) -> bool;

    /// Put `text` at the cursor of the focused element.
    ///
    /// `false` means the target rejected the injection.
    async fn inject_text(&mut self, text: &str) -> bool;
}

/// Why a candidate fill was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Auto-fill is switched off.
    Disabled,
    /// The focused application is blacklisted.
    Blacklisted,
    /// Focus-triggered fills are suppressed; manual only.
    ManualOnly,
    /// A fill was attempted too recently.
    Debounced,
    /// The focused element cannot take an injection.
    NotInjectable,
    /// No transcript has completed yet.
    NoTranscript,
}

/// What initiated a fill evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillTrigger {
    /// A focus-change event.
    Focus,
    /// The explicit manual-fill command.
    Manual,
}

/// Policy decision for one candidate fill, in order: enabled, blacklist,
/// manual-only, debounce, injectability, transcript present.
///
/// The manual trigger bypasses the enabled and manual-only gates and uses a
/// zero debounce window, but blacklist and injectability still apply.
pub fn evaluate(
    policy: &AutoFillPolicy,
    focus: &FocusDescriptor,
    trigger: FillTrigger,
    elapsed_since_last: Option<Duration>,
    has_transcript: bool,
) -> Result<(), SkipReason> {
    let manual = trigger == FillTrigger::Manual;

    if !manual && !policy.enabled {
        return Err(SkipReason::Disabled);
    }
    if policy.blacklist.contains(&focus.application_id) {
        return Err(SkipReason::Blacklisted);
    }
    if !manual && policy.manual_trigger_only {
        return Err(SkipReason::ManualOnly);
    }
    if !manual {
        // a blur/refocus pair reads as one click to the user; the window
        // starts at the previous attempt whether or not it injected
        if let Some(elapsed) = elapsed_since_last {
            if elapsed < Duration::from_millis(policy.debounce_interval_ms) {
                return Err(SkipReason::Debounced);
            }
        }
    }
    if !(focus.is_text_input && focus.can_inject) {
        return Err(SkipReason::NotInjectable);
    }
    if !has_transcript {
        return Err(SkipReason::NoTranscript);
    }

    Ok(())
}

/// Commands accepted by the coordinator task.
#[derive(Debug, Clone, Copy)]
enum FillCommand {
    ManualFill,
}

/// Cloneable surface for the manual-fill command.
#[derive(Debug, Clone)]
pub struct AutoFillHandle {
    fill_tx: mpsc::Sender<FillCommand>,
}

impl AutoFillHandle {
    /// Attempt a fill on the currently focused element, bypassing the
    /// enabled and manual-only gates.
    ///
    /// A no-op when no transcript exists yet; never errors.
    pub async fn perform_manual_fill(&self) {
        if self.fill_tx.send(FillCommand::ManualFill).await.is_err() {
            debug!("auto-fill coordinator is gone");
        }
    }
}

/// Subscribes to focus changes and the latest transcript, and injects under
/// policy through an [`AccessibilityBridge`].
pub struct AutoFillCoordinator<B: AccessibilityBridge> {
    bridge: B,
    policy_rx: watch::Receiver<AutoFillPolicy>,
    transcript_rx: watch::Receiver<Option<String>>,
    focus_rx: mpsc::Receiver<FocusDescriptor>,
    fill_rx: mpsc::Receiver<FillCommand>,
    current_focus: Option<FocusDescriptor>,
    last_attempt: Option<Instant>,
}

impl<B: AccessibilityBridge> AutoFillCoordinator<B> {
    /// Create the coordinator and its manual-fill handle.
    ///
    /// `transcript_rx` is the machine's latest-transcript cell
    /// ([`crate::PipelineHandle::latest_transcript`]); `focus_rx` is the
    /// realization of the accessibility service's focus subscription.
    pub fn new(
        bridge: B,
        policy_rx: watch::Receiver<AutoFillPolicy>,
        transcript_rx: watch::Receiver<Option<String>>,
        focus_rx: mpsc::Receiver<FocusDescriptor>,
    ) -> (Self, AutoFillHandle) {
        let (fill_tx, fill_rx) = mpsc::channel(8);

        let coordinator = Self {
            bridge,
            policy_rx,
            transcript_rx,
            focus_rx,
            fill_rx,
            current_focus: None,
            last_attempt: None,
        };

        (coordinator, AutoFillHandle { fill_tx })
    }

    /// Run until every manual-fill handle is dropped. A closed focus source
    /// only disables the automatic path; manual fills keep working.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(focus) = self.focus_rx.recv() => {
                    self.current_focus = Some(focus.clone());
                    self.consider(focus, FillTrigger::Focus).await;
                }
                command = self.fill_rx.recv() => match command {
                    Some(FillCommand::ManualFill) => {
                        let focus = self.current_focus.clone().unwrap_or_else(|| {
                            // no watcher has reported anything yet; fall back
                            // to a permissive descriptor so manual fill still
                            // works on watcher-less builds
                            FocusDescriptor::unknown()
                        });
                        self.consider(focus, FillTrigger::Manual).await;
                    }
                    None => break,
                },
            }
        }
        debug!("auto-fill coordinator stopped");
    }

    /// Evaluate one candidate fill and inject when policy allows.
    async fn consider(&mut self, focus: FocusDescriptor, trigger: FillTrigger) {
        let policy = self.policy_rx.borrow().clone();
        let transcript = self.transcript_rx.borrow().clone();
        let elapsed = self.last_attempt.map(|at| at.elapsed());

        match evaluate(&policy, &focus, trigger, elapsed, transcript.is_some()) {
            Ok(()) => {
                let Some(text) = transcript else { return };
                // stamp before the outcome is known: a failed injection
                // still debounces
                self.last_attempt = Some(Instant::now());
                if self.bridge.inject_text(&text).await {
                    info!(
                        app = %focus.application_id,
                        text_len = text.len(),
                        trigger = ?trigger,
                        "transcript injected"
                    );
                } else {
                    warn!(
                        app = %focus.application_id,
                        trigger = ?trigger,
                        "injection rejected by target"
                    );
                }
            }
            Err(reason) => debug!(
                reason = ?reason,
                trigger = ?trigger,
                app = %focus.application_id,
                "fill skipped"
            ),
        }
    }
}
