//! Focus-change event boundary.
//!
//! The platform accessibility watcher is an external collaborator; this
//! module hands its event stream to the auto-fill coordinator. A build
//! without a watcher backend keeps the manual-fill path fully working --
//! the coordinator falls back to a permissive focus descriptor for the
//! tray command.

use brain_dump_core::FocusDescriptor;
use tokio::sync::mpsc;
use tracing::info;

/// Start the platform focus watcher, if one is available for this build.
///
/// Returns `true` when a backend is feeding `tx`. The AX/AT-SPI/UIA
/// observers live with the platform accessibility service, out of process;
/// none ships in-tree.
pub fn spawn_watcher(tx: mpsc::Sender<FocusDescriptor>) -> bool {
    // Hold the sender until the coordinator goes away so the focus channel
    // reads as "open but quiet" rather than closed.
    tokio::spawn(async move {
        tx.closed().await;
    });

    info!("no focus watcher backend for this platform build");

    false
}
