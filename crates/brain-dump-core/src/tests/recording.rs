use crate::recording::{
    FIRST_LINE_MAX_LEN, RecordingInProgress, Transcript, TranscriptStatus, first_line,
};

use std::path::PathBuf;

/// WHAT: Finalizing a take assigns an id and a measurable duration
/// WHY: Ids are assigned at capture-stop time, never earlier
#[test]
fn given_in_progress_take_when_finished_then_id_and_duration_set() {
    let in_progress = RecordingInProgress::begin();
    let recording = in_progress.finish(PathBuf::from("/tmp/take.wav"));

    assert!(!recording.id.is_nil());
    assert_eq!(recording.audio_path, PathBuf::from("/tmp/take.wav"));
    assert!(recording.recorded_at_ms() > 0);
}

/// WHAT: Completed transcripts carry their text and status
/// WHY: A transcript is mutated exactly once, to complete or failed
#[test]
fn given_text_when_completing_transcript_then_status_complete() {
    let recording = RecordingInProgress::begin().finish(PathBuf::from("/tmp/a.wav"));
    let transcript = Transcript::complete(recording.id, "hello".to_string());

    assert_eq!(transcript.recording_id, recording.id);
    assert_eq!(transcript.text, "hello");
    assert_eq!(transcript.status, TranscriptStatus::Complete);
}

/// WHAT: Failed transcripts carry no text
/// WHY: Failure is terminal for a recording; there is nothing to inject
#[test]
fn given_failure_when_building_transcript_then_status_failed_and_empty() {
    let recording = RecordingInProgress::begin().finish(PathBuf::from("/tmp/a.wav"));
    let transcript = Transcript::failed(recording.id);

    assert!(transcript.text.is_empty());
    assert_eq!(transcript.status, TranscriptStatus::Failed);
}

/// WHAT: The default transcript status is pending
/// WHY: A transcript exists from the moment transcription is requested
#[test]
fn given_default_status_then_pending() {
    assert_eq!(TranscriptStatus::default(), TranscriptStatus::Pending);
}

/// WHAT: Short first lines pass through untouched
/// WHY: The ellipsis marks truncation, nothing else
#[test]
fn given_short_text_when_extracting_first_line_then_unchanged() {
    assert_eq!(first_line("quick note", FIRST_LINE_MAX_LEN), "quick note");
}

/// WHAT: Only the first line is kept from multi-line transcripts
/// WHY: Index rows show a one-line summary
#[test]
fn given_multiline_text_when_extracting_first_line_then_first_only() {
    assert_eq!(
        first_line("first thought\nsecond thought", FIRST_LINE_MAX_LEN),
        "first thought"
    );
}

/// WHAT: Long first lines are trimmed to the cap with an ellipsis
/// WHY: Summaries must stay list-sized no matter what was dictated
#[test]
fn given_long_text_when_extracting_first_line_then_truncated() {
    let text = "a".repeat(FIRST_LINE_MAX_LEN + 10);
    let line = first_line(&text, FIRST_LINE_MAX_LEN);

    assert_eq!(line.chars().count(), FIRST_LINE_MAX_LEN + 3);
    assert!(line.ends_with("..."));
}

/// WHAT: Empty transcripts produce an empty summary
/// WHY: The empty-transcript warning path still persists an entry
#[test]
fn given_empty_text_when_extracting_first_line_then_empty() {
    assert_eq!(first_line("", FIRST_LINE_MAX_LEN), "");
}
