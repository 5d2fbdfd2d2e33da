//! Brain Dump: hotkey-driven voice capture, local transcription, and
//! focus-aware auto-fill, orchestrated by `brain-dump-core`.

mod app;
mod app_command;
mod config;
mod error;
mod focus;
mod hotkey_handler;
mod modifier_key_guard;
mod notifier;
mod paste_injector;
#[cfg(test)]
mod tests;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    modifier_key_guard::ModifierKeyGuard,
    notifier::OverlayNotifier,
    paste_injector::PasteInjector,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use brain_dump_core::{
    AutoFillCoordinator, CaptureSupervisor, JsonlIndex, PipelineMachine, RecordingIndex,
    TranscriptionCoordinator,
};
use directories::ProjectDirs;
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
fn main() {
    // The guard keeps the non-blocking file writer flushing for the whole
    // process lifetime.
    let _log_guard = init_tracing();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations — dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                if let Err(e) = config.validate_commands() {
                    error!("Worker command validation failed: {:?}", e);
                    std::process::exit(1);
                }

                let index_path = match config.index_path() {
                    Ok(path) => path,
                    Err(e) => {
                        error!("Failed to resolve index path: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                // Register hotkey on the main thread — tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                // hotkey_manager is stored in the closure's captured state so it
                // lives for the entire app lifetime.
                let (manager, hotkey_id) = match HotkeyHandler::register_hotkey() {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkey: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let settings_menu_id = tray_manager.settings_item_id().clone();
                let fill_menu_id = tray_manager.fill_item_id().clone();
                let exit_menu_id = tray_manager.exit_item_id().clone();

                // Spawn the tokio runtime on a separate thread.
                // TrayManager and hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async move {
                        let (supervisor, capture, capture_events) = CaptureSupervisor::new(
                            config.capture.command.clone(),
                            config.capture.args.clone(),
                            config.ready_timeout(),
                            config.restart_policy(),
                        );

                        let coordinator = TranscriptionCoordinator::new(
                            config.transcription.command.clone(),
                            config.transcription_floor(),
                            config.transcription.timeout_multiplier,
                        );

                        let index: Arc<dyn RecordingIndex> =
                            Arc::new(JsonlIndex::new(index_path));

                        let (machine, pipeline) =
                            PipelineMachine::new(capture, capture_events, coordinator, index);

                        let injector = match PasteInjector::new() {
                            Ok(injector) => injector,
                            Err(e) => {
                                error!("Failed to create PasteInjector: {:?}", e);
                                std::process::exit(1);
                            }
                        };
                        if let Err(e) = injector.ensure_permission() {
                            // auto-fill is an optional enhancement; the
                            // pipeline runs fine without it
                            warn!(error = %e, "Auto-fill unavailable until permission is granted");
                        }

                        let (policy_tx, policy_rx) = watch::channel(config.autofill.clone());
                        let (focus_tx, focus_rx) = mpsc::channel(32);
                        if !focus::spawn_watcher(focus_tx) {
                            info!("Running without a focus watcher; fill manually from the tray");
                        }

                        let (autofill, autofill_handle) = AutoFillCoordinator::new(
                            injector,
                            policy_rx,
                            pipeline.latest_transcript(),
                            focus_rx,
                        );

                        let (command_tx, command_rx) = mpsc::channel(32);
                        let (shutdown_tx, shutdown_rx) = watch::channel(false);

                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx.clone());

                        let app = App {
                            pipeline: pipeline.clone(),
                            autofill: autofill_handle,
                            updates: pipeline.subscribe(),
                            tray_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            settings_menu_id,
                            fill_menu_id,
                            exit_menu_id,
                            notifier: OverlayNotifier::new(),
                        };

                        // Kept alive so settings reloads can push policy
                        // snapshots to the coordinator.
                        let _policy_tx = policy_tx;

                        tokio::join!(
                            supervisor.run(),
                            machine.run(),
                            autofill.run(),
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}

/// Initialize tracing with an env filter, console output, and a daily
/// rolling log file in the platform data directory.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brain_dump=debug"));

    let file_writer = ProjectDirs::from("com", "brain-dump", "Brain-Dump").and_then(|dirs| {
        let log_dir = dirs.data_dir().join("logs");
        std::fs::create_dir_all(&log_dir).ok()?;
        Some(tracing_appender::non_blocking(
            tracing_appender::rolling::daily(log_dir, "brain-dump.log"),
        ))
    });

    match file_writer {
        Some((writer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}
