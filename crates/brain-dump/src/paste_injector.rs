//! Clipboard-paste realization of the accessibility injection boundary.
//!
//! Puts transcript text at the cursor by writing it to the clipboard and
//! simulating the platform paste chord -- the one injection surface every
//! target application already accepts. Permission probing piggybacks on
//! input-synthesis access: if an `Enigo` handle cannot be created, the OS
//! has withheld it.

use crate::{AppError, AppResult, ModifierKeyGuard};

use std::panic::Location;
use std::time::Duration;

use arboard::Clipboard;
use async_trait::async_trait;
use brain_dump_core::AccessibilityBridge;
use enigo::{Enigo, Settings};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Delay between clipboard write and paste simulation.
///
/// This gives the OS clipboard manager time to process the write before
/// we simulate the paste chord. Too short and the paste may get stale
/// content; too long and the user perceives lag. 50ms is empirically
/// reliable across Windows, macOS, and Linux desktop environments.
const CLIPBOARD_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Delay between key events in the paste simulation.
///
/// Keyboard event timing: some applications and input method editors
/// need a small gap between key_down, key_click, and key_up to register
/// events correctly. 10ms is the minimum reliable interval.
const KEY_EVENT_DELAY: Duration = Duration::from_millis(10);

/// Clipboard-and-paste text injector.
pub struct PasteInjector {
    pub(crate) clipboard: Clipboard,
}

impl PasteInjector {
    /// Create a new injector.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("PasteInjector initialized");

        Ok(Self { clipboard })
    }

    /// Check that the platform grants input synthesis.
    ///
    /// Called once at startup so a missing accessibility grant surfaces as
    /// a logged warning instead of silent per-fill rejections.
    #[track_caller]
    pub fn ensure_permission(&self) -> AppResult<()> {
        if self.has_permission() {
            return Ok(());
        }
        Err(AppError::PermissionDenied {
            reason: "input synthesis unavailable; grant accessibility access in system settings"
                .to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Copy `text` to the clipboard, then simulate the paste chord.
    ///
    /// On paste failure the text is still on the clipboard, so the user can
    /// paste by hand.
    #[instrument(skip(self, text))]
    async fn copy_and_paste(&mut self, text: &str) -> AppResult<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| AppError::ClipboardError {
                reason: format!("Failed to set clipboard: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(text_len = text.len(), "Text copied to clipboard");

        // Allow the clipboard manager to process the write before pasting.
        // See CLIPBOARD_SETTLE_DELAY documentation for rationale.
        tokio::time::sleep(CLIPBOARD_SETTLE_DELAY).await;

        self.paste().await?;

        info!(text_len = text.len(), "Text injected");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn paste(&mut self) -> AppResult<()> {
        use enigo::{Direction, Key, Keyboard};

        // Simulate the paste chord using spawn_blocking since enigo
        // operations are synchronous and involve small sleeps for key event
        // timing.
        //
        // NOTE: A new Enigo instance is created inside spawn_blocking because:
        // 1. Enigo is not Send, so it cannot be moved across thread boundaries
        // 2. spawn_blocking requires 'static + Send closure
        // 3. Enigo::new() is cheap (no heavy platform initialization)
        //
        // RAII SAFETY: ModifierKeyGuard ensures the modifier is released on
        // drop, even if key operations fail or panic. Without this, a failure
        // after pressing the modifier would leave it stuck, making the
        // keyboard unusable.
        let paste_result = tokio::task::spawn_blocking(|| {
            let mut guard = ModifierKeyGuard::new()?;

            std::thread::sleep(KEY_EVENT_DELAY);

            guard
                .enigo_mut()
                .key(Key::Unicode('v'), Direction::Click)
                .map_err(|e| AppError::InjectionRejected {
                    reason: format!("Failed to press V: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            std::thread::sleep(KEY_EVENT_DELAY);

            // Guard drops here, releasing the modifier automatically.
            Ok::<(), AppError>(())
        })
        .await
        .map_err(|e| AppError::InjectionRejected {
            reason: format!("Paste task panicked: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        paste_result?;

        debug!("Paste chord simulated");

        Ok(())
    }
}

#[async_trait]
impl AccessibilityBridge for PasteInjector {
    fn has_permission(&self) -> bool {
        // Creating an input-synthesis handle fails when the OS withholds
        // access (macOS accessibility trust, Wayland portals).
        Enigo::new(&Settings::default()).is_ok()
    }

    fn request_permission(&mut self) -> bool {
        // The OS shows its own prompt on the first synthesis attempt; there
        // is no separate request call to make here.
        self.has_permission()
    }

    async fn inject_text(&mut self, text: &str) -> bool {
        match self.copy_and_paste(text).await {
            Ok(()) => true,
            Err(e) => {
                // best-effort: the coordinator logs the rejection and the
                // text remains on the clipboard
                warn!(error = ?e, "injection failed");
                false
            }
        }
    }
}
