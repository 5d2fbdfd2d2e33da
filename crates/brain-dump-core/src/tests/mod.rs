mod autofill;
mod index;
mod protocol;
mod recording;

use crate::{
    error::Result as CoreResult,
    index::{IndexEntry, RecordingIndex},
};

use std::sync::Mutex;

use uuid::Uuid;

/// In-memory recording index for machine tests.
#[derive(Default)]
pub(crate) struct MemoryIndex(Mutex<Vec<IndexEntry>>);

#[allow(clippy::unwrap_used)]
impl MemoryIndex {
    pub(crate) fn entries(&self) -> Vec<IndexEntry> {
        self.0.lock().unwrap().clone()
    }
}

#[allow(clippy::unwrap_used)]
impl RecordingIndex for MemoryIndex {
    fn append(&self, entry: &IndexEntry) -> CoreResult<()> {
        self.0.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn list(&self) -> CoreResult<Vec<IndexEntry>> {
        let mut entries = self.entries();
        entries.reverse();
        Ok(entries)
    }

    fn search(&self, query: &str) -> CoreResult<Vec<IndexEntry>> {
        let needle = query.to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| entry.transcript.to_lowercase().contains(&needle))
            .collect())
    }

    fn get_by_id(&self, id: Uuid) -> CoreResult<Option<IndexEntry>> {
        Ok(self.entries().into_iter().find(|entry| entry.id == id))
    }
}

/// Write an executable shell script standing in for an external process.
#[cfg(unix)]
#[allow(clippy::unwrap_used)]
pub(crate) fn write_script(
    dir: &std::path::Path,
    name: &str,
    body: &str,
) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
