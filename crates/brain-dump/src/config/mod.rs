mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod index_config;
mod transcription_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, index_config::IndexConfig,
    transcription_config::TranscriptionConfig,
};

pub(crate) const DEFAULT_READY_TIMEOUT_SECS: u64 = 10;
pub(crate) const DEFAULT_MAX_RESTARTS: u32 = 3;
pub(crate) const DEFAULT_RESTART_BACKOFF_MS: u64 = 1_000;
pub(crate) const DEFAULT_RESTART_BACKOFF_CAP_MS: u64 = 8_000;
pub(crate) const DEFAULT_MIN_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_TIMEOUT_MULTIPLIER: u32 = 5;

pub(crate) fn default_ready_timeout_secs() -> u64 {
    DEFAULT_READY_TIMEOUT_SECS
}

pub(crate) fn default_max_restarts() -> u32 {
    DEFAULT_MAX_RESTARTS
}

pub(crate) fn default_restart_backoff_ms() -> u64 {
    DEFAULT_RESTART_BACKOFF_MS
}

pub(crate) fn default_restart_backoff_cap_ms() -> u64 {
    DEFAULT_RESTART_BACKOFF_CAP_MS
}

pub(crate) fn default_min_timeout_secs() -> u64 {
    DEFAULT_MIN_TIMEOUT_SECS
}

pub(crate) fn default_timeout_multiplier() -> u32 {
    DEFAULT_TIMEOUT_MULTIPLIER
}
