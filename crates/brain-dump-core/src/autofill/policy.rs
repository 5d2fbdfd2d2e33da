//! Auto-fill policy snapshot and focus descriptors.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Configuration snapshot consulted on every focus event.
///
/// Persistence is owned by the app config; the coordinator only reads the
/// latest snapshot through a watch cell, so an external settings change is
/// picked up on the next event without any re-wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFillPolicy {
    /// Master switch for focus-triggered fills.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Suppress focus-triggered fills; only the manual command injects.
    #[serde(default)]
    pub manual_trigger_only: bool,
    /// Minimum interval between fill attempts, successful or not.
    #[serde(default = "default_debounce_interval_ms")]
    pub debounce_interval_ms: u64,
    /// Application identifiers for which fills are suppressed.
    #[serde(default)]
    pub blacklist: HashSet<String>,
}

impl Default for AutoFillPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            manual_trigger_only: false,
            debounce_interval_ms: default_debounce_interval_ms(),
            blacklist: HashSet::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_debounce_interval_ms() -> u64 {
    500
}

/// Ephemeral descriptor of the element that just received input focus.
///
/// One per focus-change event; consumed immediately and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusDescriptor {
    /// Identifier of the owning application (bundle id, app id, ...).
    pub application_id: String,
    /// Whether the element accepts text input at all.
    pub is_text_input: bool,
    /// Whether the platform will accept an injection right now.
    pub can_inject: bool,
}

impl FocusDescriptor {
    /// Permissive fallback used for manual fills on builds without a focus
    /// watcher: nothing is known about the target, so nothing disqualifies
    /// it except the absence of a transcript.
    pub fn unknown() -> Self {
        Self {
            application_id: String::new(),
            is_text_input: true,
            can_inject: true,
        }
    }
}
