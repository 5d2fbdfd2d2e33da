use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording index configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index file path (None = `recordings.jsonl` in the platform data dir).
    #[serde(default)]
    pub path: Option<PathBuf>,
}
