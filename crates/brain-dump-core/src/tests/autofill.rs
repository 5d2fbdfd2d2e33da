use crate::autofill::{
    AccessibilityBridge, AutoFillCoordinator, AutoFillPolicy, FillTrigger, FocusDescriptor,
    SkipReason, evaluate,
};

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Bridge double that records every injection attempt.
struct RecordingBridge {
    calls: Arc<Mutex<Vec<String>>>,
    accept: bool,
}

#[allow(clippy::unwrap_used)]
#[async_trait]
impl AccessibilityBridge for RecordingBridge {
    fn has_permission(&self) -> bool {
        true
    }

    fn request_permission(&mut self) -> bool {
        true
    }

    async fn inject_text(&mut self, text: &str) -> bool {
        self.calls.lock().unwrap().push(text.to_string());
        self.accept
    }
}

fn editable_focus(app: &str) -> FocusDescriptor {
    FocusDescriptor {
        application_id: app.to_string(),
        is_text_input: true,
        can_inject: true,
    }
}

fn policy_with(f: impl FnOnce(&mut AutoFillPolicy)) -> AutoFillPolicy {
    let mut policy = AutoFillPolicy::default();
    f(&mut policy);
    policy
}

/// Coordinator wired against watch/mpsc doubles.
struct Rig {
    calls: Arc<Mutex<Vec<String>>>,
    focus_tx: mpsc::Sender<FocusDescriptor>,
    handle: crate::autofill::AutoFillHandle,
    policy_tx: watch::Sender<AutoFillPolicy>,
    _transcript_tx: watch::Sender<Option<String>>,
}

fn rig(policy: AutoFillPolicy, transcript: Option<&str>, accept: bool) -> Rig {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let bridge = RecordingBridge {
        calls: Arc::clone(&calls),
        accept,
    };
    let (policy_tx, policy_rx) = watch::channel(policy);
    let (transcript_tx, transcript_rx) = watch::channel(transcript.map(str::to_string));
    let (focus_tx, focus_rx) = mpsc::channel(8);
    let (coordinator, handle) = AutoFillCoordinator::new(bridge, policy_rx, transcript_rx, focus_rx);
    tokio::spawn(coordinator.run());

    Rig {
        calls,
        focus_tx,
        handle,
        policy_tx,
        _transcript_tx: transcript_tx,
    }
}

/// Let the paused clock tick so the coordinator drains its channels.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ---- decision function ----

/// WHAT: An eligible focus event passes every gate
/// WHY: The happy path of the decision table
#[test]
fn given_eligible_focus_when_evaluated_then_inject() {
    let policy = AutoFillPolicy::default();
    let focus = editable_focus("com.example.notes");

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, true),
        Ok(())
    );
}

/// WHAT: Disabled policy skips before anything else
/// WHY: The master switch is gate number one
#[test]
fn given_disabled_policy_when_evaluated_then_disabled() {
    let policy = policy_with(|p| p.enabled = false);
    let focus = editable_focus("com.example.notes");

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, true),
        Err(SkipReason::Disabled)
    );
}

/// WHAT: A blacklisted application is never filled
/// WHY: Scenario C — blacklist wins regardless of transcript or debounce
#[test]
fn given_blacklisted_app_when_evaluated_then_blacklisted() {
    let policy = policy_with(|p| {
        p.blacklist = HashSet::from(["com.example.terminal".to_string()]);
    });
    let focus = editable_focus("com.example.terminal");

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, true),
        Err(SkipReason::Blacklisted)
    );
    // the manual path honors the blacklist too
    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Manual, None, true),
        Err(SkipReason::Blacklisted)
    );
}

/// WHAT: Manual-only mode suppresses focus-triggered fills
/// WHY: The user opted out of automatic injection
#[test]
fn given_manual_only_policy_when_focus_evaluated_then_manual_only() {
    let policy = policy_with(|p| p.manual_trigger_only = true);
    let focus = editable_focus("com.example.notes");

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, true),
        Err(SkipReason::ManualOnly)
    );
    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Manual, None, true),
        Ok(())
    );
}

/// WHAT: Attempts inside the debounce window are skipped
/// WHY: A blur/refocus pair is one click to the user
#[test]
fn given_recent_attempt_when_evaluated_then_debounced() {
    let policy = AutoFillPolicy::default();
    let focus = editable_focus("com.example.notes");

    assert_eq!(
        evaluate(
            &policy,
            &focus,
            FillTrigger::Focus,
            Some(Duration::from_millis(100)),
            true
        ),
        Err(SkipReason::Debounced)
    );
    // manual fills use a zero window
    assert_eq!(
        evaluate(
            &policy,
            &focus,
            FillTrigger::Manual,
            Some(Duration::from_millis(100)),
            true
        ),
        Ok(())
    );
}

/// WHAT: Non-text or injection-denied elements are skipped
/// WHY: canInject folds "not a text field" and "platform denies access"
#[test]
fn given_uninjectable_focus_when_evaluated_then_not_injectable() {
    let policy = AutoFillPolicy::default();
    let mut focus = editable_focus("com.example.notes");
    focus.can_inject = false;

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, true),
        Err(SkipReason::NotInjectable)
    );
}

/// WHAT: No cached transcript short-circuits before the inject call
/// WHY: Focus events can land before any transcription has completed
#[test]
fn given_no_transcript_when_evaluated_then_no_transcript() {
    let policy = AutoFillPolicy::default();
    let focus = editable_focus("com.example.notes");

    assert_eq!(
        evaluate(&policy, &focus, FillTrigger::Focus, None, false),
        Err(SkipReason::NoTranscript)
    );
}

// ---- coordinator ----

/// WHAT: Two focus events 100ms apart yield at most one injection
/// WHY: The debounce law with the default 500ms window
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_two_focus_events_100ms_apart_then_one_injection() {
    // Given: An eligible rig with a cached transcript
    let r = rig(AutoFillPolicy::default(), Some("hello"), true);

    // When: Two focus events 100ms apart
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    settle().await;

    // Then: Exactly one injection
    assert_eq!(r.calls.lock().unwrap().len(), 1);

    // And: Once the window elapses the next focus event injects again
    tokio::time::sleep(Duration::from_millis(600)).await;
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(r.calls.lock().unwrap().len(), 2);
}

/// WHAT: A rejected injection still advances the debounce window
/// WHY: Prevents retry storms against applications that refuse injection
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_rejected_injection_when_refocused_then_still_debounced() {
    // Given: A bridge that rejects every injection
    let r = rig(AutoFillPolicy::default(), Some("hello"), false);

    // When: Focus, rejection, immediate refocus
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    settle().await;

    // Then: Only the first attempt reached the bridge
    assert_eq!(r.calls.lock().unwrap().len(), 1);
}

/// WHAT: Blacklisted focus events never reach the bridge
/// WHY: Scenario C, end to end through the coordinator
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_blacklisted_focus_when_received_then_no_injection() {
    // Given: The focused app is blacklisted
    let policy = policy_with(|p| {
        p.blacklist = HashSet::from(["com.example.terminal".to_string()]);
    });
    let r = rig(policy, Some("hello"), true);

    // When: A focus event for the blacklisted app arrives
    r.focus_tx
        .send(editable_focus("com.example.terminal"))
        .await
        .unwrap();
    settle().await;

    // Then: No injection, regardless of cached transcript and debounce
    assert!(r.calls.lock().unwrap().is_empty());
}

/// WHAT: Manual fill without any transcript is a silent no-op
/// WHY: The idempotence property — never throws, never injects
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_no_transcript_when_manual_fill_then_noop() {
    // Given: No transcription has completed yet
    let r = rig(AutoFillPolicy::default(), None, true);

    // When: Requesting a manual fill
    r.handle.perform_manual_fill().await;
    settle().await;

    // Then: Nothing reaches the bridge
    assert!(r.calls.lock().unwrap().is_empty());
}

/// WHAT: Manual fill bypasses the disabled gate
/// WHY: The explicit command expresses clear user intent
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_disabled_policy_when_manual_fill_then_injects() {
    // Given: Auto-fill disabled, but a transcript is available
    let policy = policy_with(|p| p.enabled = false);
    let r = rig(policy, Some("hello"), true);

    // When: A focus event (skipped) followed by a manual fill
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    r.handle.perform_manual_fill().await;
    settle().await;

    // Then: Only the manual attempt injected
    assert_eq!(r.calls.lock().unwrap().as_slice(), ["hello"]);
}

/// WHAT: Manual fill works before any focus event was observed
/// WHY: Builds without a focus watcher still support the tray command
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_no_focus_seen_when_manual_fill_then_injects_via_fallback() {
    // Given: A transcript but no focus watcher feeding events
    let r = rig(AutoFillPolicy::default(), Some("hello"), true);

    // When: Requesting a manual fill
    r.handle.perform_manual_fill().await;
    settle().await;

    // Then: The permissive fallback descriptor lets the fill through
    assert_eq!(r.calls.lock().unwrap().as_slice(), ["hello"]);
}

/// WHAT: A policy change is picked up on the next event
/// WHY: The coordinator reads the latest snapshot per event, no re-wiring
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_policy_updated_when_next_focus_arrives_then_new_policy_applies() {
    // Given: A rig that starts disabled
    let r = rig(policy_with(|p| p.enabled = false), Some("hello"), true);
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    settle().await;
    assert!(r.calls.lock().unwrap().is_empty());

    // When: Settings flip the switch on
    r.policy_tx
        .send(AutoFillPolicy::default())
        .unwrap();
    r.focus_tx
        .send(editable_focus("com.example.notes"))
        .await
        .unwrap();
    settle().await;

    // Then: The next focus event injects
    assert_eq!(r.calls.lock().unwrap().len(), 1);
}
