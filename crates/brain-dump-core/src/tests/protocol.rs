use crate::capture::{ProtocolEvent, parse_line};

use std::path::PathBuf;

/// WHAT: READY parses to the ready event
/// WHY: Startup gating depends on recognizing initialization
#[test]
fn given_ready_line_when_parsed_then_ready_event() {
    assert_eq!(parse_line("READY"), Some(ProtocolEvent::Ready));
}

/// WHAT: RECORDING_STARTED parses to the started event
/// WHY: The state machine stamps the recording start on this event
#[test]
fn given_started_line_when_parsed_then_started_event() {
    assert_eq!(parse_line("RECORDING_STARTED"), Some(ProtocolEvent::Started));
}

/// WHAT: RECORDING_STOPPED carries the path after the first colon
/// WHY: The path is the only handle to the captured take
#[test]
fn given_stopped_line_when_parsed_then_path_extracted() {
    assert_eq!(
        parse_line("RECORDING_STOPPED:/tmp/recording_2025-10-25.wav"),
        Some(ProtocolEvent::Stopped {
            path: PathBuf::from("/tmp/recording_2025-10-25.wav")
        })
    );
}

/// WHAT: Paths containing spaces survive parsing intact
/// WHY: Recordings land wherever the user pointed the recorder
#[test]
fn given_path_with_spaces_when_parsed_then_path_intact() {
    assert_eq!(
        parse_line("RECORDING_STOPPED:/tmp/a b.wav"),
        Some(ProtocolEvent::Stopped {
            path: PathBuf::from("/tmp/a b.wav")
        })
    );
}

/// WHAT: Only the first colon delimits the payload
/// WHY: Colons inside filenames must not corrupt the path
#[test]
fn given_path_with_colon_when_parsed_then_split_at_first_colon_only() {
    assert_eq!(
        parse_line("RECORDING_STOPPED:/tmp/take:2.wav"),
        Some(ProtocolEvent::Stopped {
            path: PathBuf::from("/tmp/take:2.wav")
        })
    );
}

/// WHAT: ERROR lines parse to a fault with the kind preserved
/// WHY: The recorder reports operation failures without exiting
#[test]
fn given_error_line_when_parsed_then_fault_with_kind() {
    assert_eq!(
        parse_line("ERROR:RecordingStartFailed"),
        Some(ProtocolEvent::Fault {
            kind: "RecordingStartFailed".to_string()
        })
    );
}

/// WHAT: Unknown lines are diagnostic noise, not protocol faults
/// WHY: The recorder may print debug output at any time
#[test]
fn given_unknown_line_when_parsed_then_none() {
    assert_eq!(parse_line("ALSA lib pcm.c: underrun occurred"), None);
    assert_eq!(parse_line(""), None);
}

/// WHAT: Trailing carriage returns are stripped before matching
/// WHY: Line endings vary across recorder builds
#[test]
fn given_crlf_terminated_line_when_parsed_then_token_recognized() {
    assert_eq!(parse_line("READY\r"), Some(ProtocolEvent::Ready));
}
