use crate::AppCommand;

use tokio::sync::mpsc;

/// WHAT: A toggle sent into a closed channel fails loudly
/// WHY: A dead app loop must surface as an error, not a silent drop
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_closed_channel_when_sending_toggle_then_error() {
    // Given: A closed command channel
    let (command_tx, command_rx) = mpsc::channel(1);
    drop(command_rx);

    // When: Sending Toggle
    let result = command_tx.send(AppCommand::Toggle).await;

    // Then: The send fails
    assert!(result.is_err());
}

/// WHAT: One dispatched toggle arrives as exactly one command
/// WHY: The dispatcher contract is one toggle per hotkey event
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_open_channel_when_toggle_sent_then_received_once() {
    // Given: An open command channel
    let (command_tx, mut command_rx) = mpsc::channel(32);

    // When: Sending a single Toggle
    command_tx.send(AppCommand::Toggle).await.unwrap();

    // Then: Exactly one Toggle is received
    let command = command_rx.recv().await.unwrap();
    assert!(matches!(command, AppCommand::Toggle));
    assert!(command_rx.try_recv().is_err());
}

/// WHAT: Shutdown commands pass through the same channel
/// WHY: The tray exit path and the hotkey path share the app loop
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_open_channel_when_shutdown_sent_then_received() {
    // Given: An open command channel
    let (command_tx, mut command_rx) = mpsc::channel(32);

    // When: Sending Shutdown
    command_tx.send(AppCommand::Shutdown).await.unwrap();

    // Then: Shutdown is received
    assert!(matches!(
        command_rx.recv().await.unwrap(),
        AppCommand::Shutdown
    ));
}
