/// Commands sent from the hotkey handler to the main application.
#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    /// Toggle the pipeline: start or stop a capture.
    Toggle,
    /// Request application shutdown.
    Shutdown,
}
