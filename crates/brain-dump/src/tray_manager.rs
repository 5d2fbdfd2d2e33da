//! System tray icon with state-based updates.
//!
//! Manages a system tray icon for the four pipeline states and a context
//! menu for Settings, manual fill, and Exit.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Side length of the generated tray icon in pixels.
const ICON_SIZE: u32 = 32;

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    settings_item_id: MenuId,
    fill_item_id: MenuId,
    exit_item_id: MenuId,
}

impl TrayManager {
    /// Create a new tray manager with initial state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let settings_item = MenuItem::new("Settings", true, None);
        let fill_item = MenuItem::new("Fill Last Transcript", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let settings_id = settings_item.id().clone();
        let fill_id = fill_item.id().clone();
        let exit_id = exit_item.id().clone();

        for item in [&settings_item, &fill_item, &exit_item] {
            menu.append(item).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to build tray menu: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip("Brain Dump - Ready")
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            settings_item_id: settings_id,
            fill_item_id: fill_id,
            exit_item_id: exit_id,
        })
    }

    /// Update the tray icon state with new icon and tooltip.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        let tooltip = match state {
            TrayIconState::Idle => "Brain Dump - Ready",
            TrayIconState::Recording => "Brain Dump - Recording...",
            TrayIconState::Processing => "Brain Dump - Transcribing...",
            TrayIconState::Error => "Brain Dump - Error",
        };

        self.tray_icon
            .set_icon(Some(Self::load_icon(state)?))
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Build the icon for a state.
    ///
    /// Icons are generated at runtime -- solid status discs need no bundled
    /// assets, so the binary works regardless of install location.
    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        Icon::from_rgba(icon_rgba(state), ICON_SIZE, ICON_SIZE).map_err(|e| {
            AppError::ConfigError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    /// Get the settings menu item ID.
    pub fn settings_item_id(&self) -> &MenuId {
        &self.settings_item_id
    }

    /// Get the fill menu item ID.
    pub fn fill_item_id(&self) -> &MenuId {
        &self.fill_item_id
    }

    /// Get the exit menu item ID.
    pub fn exit_item_id(&self) -> &MenuId {
        &self.exit_item_id
    }
}

/// Render a status disc: gray idle, red recording, amber transcribing,
/// purple error, on a transparent background.
pub(crate) fn icon_rgba(state: TrayIconState) -> Vec<u8> {
    let (r, g, b) = match state {
        TrayIconState::Idle => (120, 120, 120),
        TrayIconState::Recording => (220, 60, 60),
        TrayIconState::Processing => (235, 175, 45),
        TrayIconState::Error => (160, 60, 200),
    };

    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 2.0;

    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            if (dx * dx + dy * dy).sqrt() <= radius {
                rgba.extend_from_slice(&[r, g, b, 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }

    rgba
}
