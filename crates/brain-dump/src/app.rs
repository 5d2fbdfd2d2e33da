use crate::{AppCommand, AppResult, OverlayNotifier, TrayCommand, TrayIconState, config::Config};

use brain_dump_core::{AutoFillHandle, PipelineHandle, StateChange};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread. Communicates tray icon updates
/// back to the main thread via `tray_proxy` because `TrayIcon` is `!Send`
/// and must remain on the UI thread.
pub struct App {
    pub(crate) pipeline: PipelineHandle,
    pub(crate) autofill: AutoFillHandle,
    pub(crate) updates: broadcast::Receiver<StateChange>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) settings_menu_id: tray_icon::menu::MenuId,
    pub(crate) fill_menu_id: tray_icon::menu::MenuId,
    pub(crate) exit_menu_id: tray_icon::menu::MenuId,
    pub(crate) notifier: OverlayNotifier,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Brain Dump starting");

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver which
        // HAS blocking recv() -- zero polling, instant response, one thread.
        //
        // Shutdown: when tray_event_rx is dropped (main loop breaks),
        // tray_event_tx.blocking_send() fails, breaking the blocking loop.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    if let Err(e) = self.handle_tray_event(event).await {
                        error!(error = ?e, "Failed to handle tray event");
                    }
                }

                Some(command) = self.command_rx.recv() => match command {
                    AppCommand::Toggle => {
                        if let Err(e) = self.toggle_pipeline().await {
                            error!(error = ?e, "Failed to toggle pipeline");
                        }
                    }
                    AppCommand::Shutdown => {
                        info!("Shutdown requested");
                        break;
                    }
                },

                update = self.updates.recv() => match update {
                    Ok(change) => self.handle_state_change(change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed pipeline state updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Pipeline updates closed, shutting down");
                        break;
                    }
                },
            }
        }

        drop(tray_event_rx);

        self.pipeline.shutdown().await;
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(std::time::Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
        info!("Brain Dump shut down successfully");

        Ok(())
    }

    /// Forward a pipeline state change to the tray and the overlay.
    fn handle_state_change(&self, change: StateChange) {
        let icon = TrayIconState::from(&change.state);
        if self
            .tray_proxy
            .send_event(TrayCommand::SetState(icon))
            .is_err()
        {
            debug!("Tray event loop is gone");
        }

        self.notifier.notify(&change);
    }

    /// Toggle the pipeline state machine.
    async fn toggle_pipeline(&self) -> AppResult<()> {
        self.pipeline.toggle().await?;
        Ok(())
    }

    /// Handle tray menu events.
    #[instrument(skip(self, event))]
    async fn handle_tray_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;

        if *event_id == self.settings_menu_id {
            let path = Config::path()?;
            let _ = open::that(path);
            info!("Opened configuration file");
        } else if *event_id == self.fill_menu_id {
            self.autofill.perform_manual_fill().await;
            info!("Manual fill requested from tray");
        } else if *event_id == self.exit_menu_id {
            info!("Exit requested from tray menu");
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }

        Ok(())
    }
}
