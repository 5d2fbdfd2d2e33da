use crate::config::{default_min_timeout_secs, default_timeout_multiplier};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// External transcription process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcriber command: an absolute path, or a name resolved on PATH.
    pub command: PathBuf,

    /// Deadline floor in seconds, applied to short takes.
    #[serde(default = "default_min_timeout_secs")]
    pub min_timeout_secs: u64,

    /// Deadline multiplier over the capture duration for longer takes.
    #[serde(default = "default_timeout_multiplier")]
    pub timeout_multiplier: u32,
}
