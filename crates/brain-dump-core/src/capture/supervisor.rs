//! Capture process supervisor.
//!
//! Keeps exactly one instance of the external recorder alive, translates
//! its line protocol into typed [`CaptureEvent`]s, and restarts it with
//! exponential backoff when it dies on its own. A deliberate `stop`/`quit`
//! is never classified as a crash: the tagged [`SupervisorStatus`] records
//! that we asked the process to die before the command is written.

use crate::{
    capture::protocol::{self, ProtocolEvent},
    error::{CoreError, Result as CoreResult},
};

use std::{panic::Location, path::PathBuf, process::Stdio, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{Child, ChildStderr, ChildStdin, ChildStdout, Command},
    sync::{mpsc, watch},
    time::timeout,
};
use tracing::{debug, error, info, instrument, warn};

/// Grace period for the child to exit after `quit` or after its stdout
/// closes, before it is killed outright.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Typed events re-exposed to the pipeline state machine, in the order the
/// underlying process emitted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The recorder confirmed capture is active.
    Started,
    /// Capture finished and the audio file was written.
    Stopped {
        /// Path to the saved audio file.
        audio_path: PathBuf,
    },
    /// The capture process failed.
    Error {
        /// Short diagnostic for the UI.
        reason: String,
        /// The restart budget is spent; supervision has ended.
        fatal: bool,
    },
}

/// Commands accepted by the supervisor task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaptureCommand {
    /// Ask the recorder to begin capturing (`start\n`).
    Start,
    /// Ask the recorder to stop and save the take (`stop\n`).
    Stop,
    /// Deliberately shut the recorder down (`quit\n`).
    Shutdown,
}

/// Restart policy for unintentional exits.
#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    /// Maximum consecutive restart attempts before giving up.
    pub max_attempts: u32,
    /// First backoff delay; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Backoff delay before restart attempt `attempt` (1-based):
/// `base * 2^(attempt - 1)`, capped at `max_delay`.
pub fn restart_delay(policy: &RestartPolicy, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    policy
        .base_delay
        .saturating_mul(1u32 << exp)
        .min(policy.max_delay)
}

/// Tagged supervisor status.
///
/// The intentional-death invariant hangs off this: an exit observed while
/// `Stopping` was the last thing we asked for is not a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorStatus {
    /// Child spawned, READY not seen yet.
    Launching,
    /// Child confirmed READY; commands may be issued.
    Running,
    /// A deliberate `stop` or `quit` was issued.
    Stopping,
    /// Child exited on its own.
    Crashed,
}

/// Cloneable command surface for the supervisor task.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    command_tx: mpsc::Sender<CaptureCommand>,
    status_rx: watch::Receiver<SupervisorStatus>,
}

impl CaptureHandle {
    pub(crate) fn from_parts(
        command_tx: mpsc::Sender<CaptureCommand>,
        status_rx: watch::Receiver<SupervisorStatus>,
    ) -> Self {
        Self {
            command_tx,
            status_rx,
        }
    }

    /// Ask the recorder to begin capturing.
    ///
    /// The pipeline state machine only issues this from `Idle`/`Error`.
    pub async fn start_capture(&self) -> CoreResult<()> {
        self.send(CaptureCommand::Start).await
    }

    /// Ask the recorder to stop capturing and save the take.
    pub async fn stop_capture(&self) -> CoreResult<()> {
        self.send(CaptureCommand::Stop).await
    }

    /// Deliberately shut the recorder down and end supervision.
    pub async fn shutdown(&self) -> CoreResult<()> {
        self.send(CaptureCommand::Shutdown).await
    }

    /// Current tagged supervisor status.
    pub fn status(&self) -> SupervisorStatus {
        *self.status_rx.borrow()
    }

    async fn send(&self, command: CaptureCommand) -> CoreResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CoreError::ChannelClosed {
                message: "capture supervisor is gone".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Supervises the external capture process.
pub struct CaptureSupervisor {
    command: PathBuf,
    args: Vec<String>,
    ready_timeout: Duration,
    policy: RestartPolicy,
    command_rx: mpsc::Receiver<CaptureCommand>,
    event_tx: mpsc::Sender<CaptureEvent>,
    status_tx: watch::Sender<SupervisorStatus>,
    attempts: u32,
}

/// Why the per-child serve loop ended.
enum Served {
    /// `quit` was issued and the child reaped.
    Shutdown,
    /// The child's stdout closed and the child was reaped.
    ChildExited(Option<i32>),
}

impl CaptureSupervisor {
    /// Create a supervisor, its command handle, and the event stream the
    /// pipeline state machine consumes. Events are delivered strictly in
    /// the order the process emits them.
    pub fn new(
        command: PathBuf,
        args: Vec<String>,
        ready_timeout: Duration,
        policy: RestartPolicy,
    ) -> (Self, CaptureHandle, mpsc::Receiver<CaptureEvent>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (status_tx, status_rx) = watch::channel(SupervisorStatus::Launching);

        let supervisor = Self {
            command,
            args,
            ready_timeout,
            policy,
            command_rx,
            event_tx,
            status_tx,
            attempts: 0,
        };

        (
            supervisor,
            CaptureHandle::from_parts(command_tx, status_rx),
            event_rx,
        )
    }

    /// Run the supervision loop until shutdown or until the restart budget
    /// is spent.
    #[instrument(skip(self), fields(command = ?self.command))]
    pub async fn run(mut self) {
        let mut first_spawn = true;
        loop {
            let mut child = match self.spawn_child() {
                Ok(child) => child,
                Err(e) => {
                    error!(error = %e, "failed to spawn capture process");
                    if !self.back_off(e.user_reason()).await {
                        return;
                    }
                    continue;
                }
            };

            let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
                // stdio was configured piped; hitting this means the spawn
                // API itself misbehaved
                let _ = child.start_kill();
                if !self.back_off("recorder stdio unavailable".to_string()).await {
                    return;
                }
                continue;
            };
            if let Some(stderr) = child.stderr.take() {
                drain_stderr(stderr);
            }

            let mut lines = BufReader::new(stdout).lines();

            self.set_status(SupervisorStatus::Launching);
            match timeout(self.ready_timeout, await_ready(&mut lines)).await {
                Ok(true) => {
                    self.set_status(SupervisorStatus::Running);
                    info!("capture process ready");
                }
                Ok(false) => {
                    reap(&mut child).await;
                    let failure = CoreError::CaptureStartupFailure {
                        reason: "recorder exited before READY".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    };
                    error!(error = %failure, "capture startup failed");
                    if !self.back_off(failure.user_reason()).await {
                        return;
                    }
                    continue;
                }
                Err(_) => {
                    reap(&mut child).await;
                    let failure = CoreError::CaptureStartupFailure {
                        reason: format!("no READY within {:?}", self.ready_timeout),
                        location: ErrorLocation::from(Location::caller()),
                    };
                    error!(error = %failure, "capture startup failed");
                    if !self.back_off(failure.user_reason()).await {
                        return;
                    }
                    continue;
                }
            }

            // Commands queued against a child that later died are stale: a
            // Start addressed to the dead recorder must not trigger a
            // surprise recording on the fresh one. Each drop is surfaced as
            // a capture error so the state machine never waits on a
            // swallowed command. Commands queued during the *first* launch
            // window are legitimate and left for the serve loop; Shutdown is
            // always honored.
            if first_spawn {
                first_spawn = false;
            } else if self.drain_stale_commands().await {
                self.quit_child(&mut child, stdin).await;
                return;
            }

            match self.serve(&mut child, stdin, &mut lines).await {
                Served::Shutdown => return,
                Served::ChildExited(code) => {
                    if self.status() == SupervisorStatus::Stopping {
                        // we asked it to die (or to stop, and it chose to
                        // exit afterwards); respawn without penalty
                        info!("capture process exited after a deliberate stop");
                        continue;
                    }
                    self.set_status(SupervisorStatus::Crashed);
                    let detail = match code {
                        Some(code) => format!("capture process exited with code {code}"),
                        None => "capture process killed by signal".to_string(),
                    };
                    let crash = CoreError::CaptureCrashed {
                        reason: detail,
                        location: ErrorLocation::from(Location::caller()),
                    };
                    error!(error = %crash, "capture process died unexpectedly");
                    if !self.back_off(crash.user_reason()).await {
                        return;
                    }
                }
            }
        }
    }

    /// Serve one live child: forward commands to stdin, parse stdout into
    /// events, until the child exits or `quit` is issued.
    async fn serve(
        &mut self,
        child: &mut Child,
        mut stdin: ChildStdin,
        lines: &mut Lines<BufReader<ChildStdout>>,
    ) -> Served {
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line).await,
                    Ok(None) | Err(_) => {
                        let code = reap(child).await;
                        return Served::ChildExited(code);
                    }
                },
                command = self.command_rx.recv() => match command {
                    Some(CaptureCommand::Start) => {
                        if self.status() == SupervisorStatus::Stopping {
                            self.set_status(SupervisorStatus::Running);
                        }
                        write_command(&mut stdin, b"start\n").await;
                    }
                    Some(CaptureCommand::Stop) => {
                        // flag intent before the command goes out, so an
                        // exit caused by the stop is never read as a crash
                        self.set_status(SupervisorStatus::Stopping);
                        write_command(&mut stdin, b"stop\n").await;
                    }
                    Some(CaptureCommand::Shutdown) | None => {
                        self.quit_child(child, stdin).await;
                        return Served::Shutdown;
                    }
                },
            }
        }
    }

    /// Translate one stdout line into a typed event.
    async fn handle_line(&mut self, line: &str) {
        match protocol::parse_line(line) {
            Some(ProtocolEvent::Ready) => debug!("recorder re-announced READY"),
            Some(ProtocolEvent::Started) => {
                self.attempts = 0;
                self.forward(CaptureEvent::Started).await;
            }
            Some(ProtocolEvent::Stopped { path }) => {
                self.forward(CaptureEvent::Stopped { audio_path: path }).await;
            }
            Some(ProtocolEvent::Fault { kind }) => {
                warn!(kind = %kind, "recorder reported a fault");
                self.forward(CaptureEvent::Error {
                    reason: format!("recorder fault: {kind}"),
                    fatal: false,
                })
                .await;
            }
            // diagnostic noise reaches the logs, never the protocol
            None => debug!(line = %line, "recorder diagnostic"),
        }
    }

    async fn forward(&self, event: CaptureEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("capture event dropped, no listener");
        }
    }

    /// Deliberate shutdown: flag intent, write `quit`, reap.
    async fn quit_child(&mut self, child: &mut Child, mut stdin: ChildStdin) {
        self.set_status(SupervisorStatus::Stopping);
        write_command(&mut stdin, b"quit\n").await;
        drop(stdin);
        reap(child).await;
        info!("capture process shut down");
    }

    /// Discard commands that arrived while no child was serving.
    /// Returns `true` when a shutdown was requested in the meantime.
    async fn drain_stale_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(CaptureCommand::Shutdown) => return true,
                Ok(stale) => {
                    warn!(command = ?stale, "dropping command issued while recorder was down");
                    self.forward(CaptureEvent::Error {
                        reason: "capture process restarted while a command was pending"
                            .to_string(),
                        fatal: false,
                    })
                    .await;
                }
                Err(mpsc::error::TryRecvError::Empty) => return false,
                Err(mpsc::error::TryRecvError::Disconnected) => return true,
            }
        }
    }

    /// Emit a capture error and sleep the backoff delay.
    /// Returns `false` when the restart budget is spent.
    async fn back_off(&mut self, reason: String) -> bool {
        self.attempts += 1;
        if self.attempts > self.policy.max_attempts {
            error!(
                reason = %reason,
                attempts = self.attempts,
                "restart budget exhausted, giving up"
            );
            self.forward(CaptureEvent::Error {
                reason: format!("{reason} (giving up)"),
                fatal: true,
            })
            .await;
            return false;
        }

        self.forward(CaptureEvent::Error {
            reason: reason.clone(),
            fatal: false,
        })
        .await;

        let delay = restart_delay(&self.policy, self.attempts);
        warn!(
            reason = %reason,
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "restarting capture process"
        );
        tokio::time::sleep(delay).await;
        true
    }

    fn spawn_child(&self) -> CoreResult<Child> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::CaptureStartupFailure {
                reason: format!("failed to spawn {:?}: {e}", self.command),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn status(&self) -> SupervisorStatus {
        *self.status_tx.borrow()
    }

    fn set_status(&self, status: SupervisorStatus) {
        let _ = self.status_tx.send(status);
    }
}

/// Read lines until READY. Returns `false` if stdout closes first.
async fn await_ready(lines: &mut Lines<BufReader<ChildStdout>>) -> bool {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match protocol::parse_line(&line) {
                Some(ProtocolEvent::Ready) => return true,
                _ => debug!(line = %line, "pre-READY output"),
            },
            Ok(None) | Err(_) => return false,
        }
    }
}

/// Wait for the child within the grace period, killing it if it lingers.
/// Returns the exit code when one is available.
async fn reap(child: &mut Child) -> Option<i32> {
    match timeout(EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => status.code(),
        Ok(Err(e)) => {
            warn!(error = %e, "failed to wait for capture process");
            None
        }
        Err(_) => {
            let _ = child.start_kill();
            match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, "failed to reap capture process after kill");
                    None
                }
            }
        }
    }
}

/// Best-effort write of one protocol command; a dead pipe surfaces through
/// the child's exit, not here.
async fn write_command(stdin: &mut ChildStdin, command: &[u8]) {
    if let Err(e) = stdin.write_all(command).await {
        warn!(error = %e, "failed to write command to recorder");
        return;
    }
    if let Err(e) = stdin.flush().await {
        warn!(error = %e, "failed to flush recorder stdin");
    }
}

/// Forward recorder stderr to the logs so collaborator diagnostics are not
/// silently swallowed.
fn drain_stderr(stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(line = %line, "recorder stderr");
        }
    });
}
