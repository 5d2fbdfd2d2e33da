use crate::{
    index::{IndexEntry, JsonlIndex, RecordingIndex},
    recording::{RecordingInProgress, Transcript},
};

use std::{fs::OpenOptions, io::Write, path::Path};

use uuid::Uuid;

fn entry(dir: &Path, text: &str) -> IndexEntry {
    let recording = RecordingInProgress::begin().finish(dir.join("take.wav"));
    IndexEntry::from_parts(&recording, &Transcript::complete(recording.id, text.to_string()))
}

/// WHAT: Appended entries come back newest-first
/// WHY: The history view lists the latest take on top
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_entries_when_listed_then_newest_first() {
    // Given: Two appended entries
    let dir = tempfile::tempdir().unwrap();
    let index = JsonlIndex::new(dir.path().join("recordings.jsonl"));
    let older = entry(dir.path(), "first note");
    let newer = entry(dir.path(), "second note");
    index.append(&older).unwrap();
    index.append(&newer).unwrap();

    // When: Listing
    let listed = index.list().unwrap();

    // Then: Newest first
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].transcript, "second note");
    assert_eq!(listed[1].transcript, "first note");
}

/// WHAT: Search matches transcripts case-insensitively
/// WHY: Users search the way they remember, not the way Whisper spelled it
#[test]
#[allow(clippy::unwrap_used)]
fn given_entries_when_searching_then_case_insensitive_match() {
    // Given: One matching and one non-matching entry
    let dir = tempfile::tempdir().unwrap();
    let index = JsonlIndex::new(dir.path().join("recordings.jsonl"));
    index.append(&entry(dir.path(), "Groceries for Tuesday")).unwrap();
    index.append(&entry(dir.path(), "standup notes")).unwrap();

    // When: Searching with different casing
    let found = index.search("GROCERIES").unwrap();

    // Then: The matching entry is returned
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].transcript, "Groceries for Tuesday");
}

/// WHAT: Entries are retrievable by id
/// WHY: Detail views address a single recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_appended_entry_when_fetched_by_id_then_found() {
    // Given: An appended entry
    let dir = tempfile::tempdir().unwrap();
    let index = JsonlIndex::new(dir.path().join("recordings.jsonl"));
    let wanted = entry(dir.path(), "find me");
    index.append(&wanted).unwrap();

    // When/Then: Fetching by its id finds it, a random id does not
    assert_eq!(index.get_by_id(wanted.id).unwrap(), Some(wanted));
    assert_eq!(index.get_by_id(Uuid::new_v4()).unwrap(), None);
}

/// WHAT: A corrupt line is skipped, not fatal
/// WHY: A torn write must not poison the whole index
#[test]
#[allow(clippy::unwrap_used)]
fn given_corrupt_line_when_listing_then_skipped() {
    // Given: Two valid entries with garbage wedged between them
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recordings.jsonl");
    let index = JsonlIndex::new(path.clone());
    index.append(&entry(dir.path(), "before")).unwrap();
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ not json").unwrap();
    }
    index.append(&entry(dir.path(), "after")).unwrap();

    // When: Listing
    let listed = index.list().unwrap();

    // Then: Both valid entries survive
    assert_eq!(listed.len(), 2);
}

/// WHAT: A missing index file lists as empty
/// WHY: The file is created lazily on the first append
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_listed_then_empty() {
    let dir = tempfile::tempdir().unwrap();
    let index = JsonlIndex::new(dir.path().join("recordings.jsonl"));

    assert!(index.list().unwrap().is_empty());
    assert!(index.search("anything").unwrap().is_empty());
}
