//! Configuration management for brain-dump.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, lazy validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{CaptureConfig, IndexConfig, TranscriptionConfig},
};

use std::{fs, io::Write, panic::Location, path::PathBuf, time::Duration};

use crate::config::{
    DEFAULT_MAX_RESTARTS, DEFAULT_MIN_TIMEOUT_SECS, DEFAULT_READY_TIMEOUT_SECS,
    DEFAULT_RESTART_BACKOFF_CAP_MS, DEFAULT_RESTART_BACKOFF_MS, DEFAULT_TIMEOUT_MULTIPLIER,
};
use brain_dump_core::{AutoFillPolicy, RestartPolicy};
use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External capture process settings.
    pub capture: CaptureConfig,
    /// External transcription process settings.
    pub transcription: TranscriptionConfig,
    /// Auto-fill policy snapshot.
    #[serde(default)]
    pub autofill: AutoFillPolicy,
    /// Recording index settings.
    #[serde(default)]
    pub index: IndexConfig,
}

impl Config {
    /// Load configuration from disk, creating a default if not found.
    ///
    /// Note: this does NOT validate that the external commands exist. Call
    /// `validate_commands()` at startup so the error names the offending
    /// path; bare command names are left to PATH resolution at spawn time.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// Validate that absolutely-pathed external commands exist.
    ///
    /// Called at startup, not at load time, so the settings file can be
    /// edited to fix a bad path without the app refusing to parse it.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate_commands(&self) -> AppResult<()> {
        for (label, command) in [
            ("capture", &self.capture.command),
            ("transcription", &self.transcription.command),
        ] {
            if command.is_absolute() && !command.exists() {
                return Err(AppError::ConfigError {
                    reason: format!(
                        "{} command not found at {:?}. Install the worker or fix the path in the settings file.",
                        label, command
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
        Ok(())
    }

    /// Save configuration to disk using the atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames, to prevent
    /// corruption if the process crashes mid-write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Restart policy for the capture supervisor.
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            max_attempts: self.capture.max_restarts,
            base_delay: Duration::from_millis(self.capture.restart_backoff_ms),
            max_delay: Duration::from_millis(self.capture.restart_backoff_cap_ms),
        }
    }

    /// READY window for the capture supervisor.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.capture.ready_timeout_secs)
    }

    /// Deadline floor for the transcription coordinator.
    pub fn transcription_floor(&self) -> Duration {
        Duration::from_secs(self.transcription.min_timeout_secs)
    }

    /// Resolved path of the recording index file.
    #[track_caller]
    pub fn index_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.index.path {
            return Ok(path.clone());
        }
        let proj_dirs = Self::project_dirs()?;
        Ok(proj_dirs.data_dir().join("recordings.jsonl"))
    }

    /// Path of the configuration file itself.
    #[track_caller]
    pub fn path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "brain-dump", "Brain-Dump").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let config = Config {
            capture: CaptureConfig {
                command: PathBuf::from("brain-dump-recorder"),
                args: Vec::new(),
                ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
                max_restarts: DEFAULT_MAX_RESTARTS,
                restart_backoff_ms: DEFAULT_RESTART_BACKOFF_MS,
                restart_backoff_cap_ms: DEFAULT_RESTART_BACKOFF_CAP_MS,
            },
            transcription: TranscriptionConfig {
                command: PathBuf::from("brain-dump-transcribe"),
                min_timeout_secs: DEFAULT_MIN_TIMEOUT_SECS,
                timeout_multiplier: DEFAULT_TIMEOUT_MULTIPLIER,
            },
            autofill: AutoFillPolicy::default(),
            index: IndexConfig::default(),
        };

        config.save()?;

        warn!(
            "Default config created. The recorder and transcriber workers must be on PATH \
             before recording."
        );

        Ok(config)
    }
}
