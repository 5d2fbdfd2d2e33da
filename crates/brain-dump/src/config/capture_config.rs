use crate::config::{
    default_max_restarts, default_ready_timeout_secs, default_restart_backoff_cap_ms,
    default_restart_backoff_ms,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// External capture process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Recorder command: an absolute path, or a name resolved on PATH.
    pub command: PathBuf,

    /// Extra arguments passed to the recorder.
    #[serde(default)]
    pub args: Vec<String>,

    /// Seconds to wait for READY before counting a startup failure.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Consecutive restart attempts before the supervisor gives up.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// First restart backoff in milliseconds; doubles per attempt.
    #[serde(default = "default_restart_backoff_ms")]
    pub restart_backoff_ms: u64,

    /// Upper bound on the restart backoff in milliseconds.
    #[serde(default = "default_restart_backoff_cap_ms")]
    pub restart_backoff_cap_ms: u64,
}
