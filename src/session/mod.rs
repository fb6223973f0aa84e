//! Long-running external command sessions.
//!
//! A [`SessionManager`] runs one external program at a time for a single tool
//! and tracks it from launch to its terminal classification. Progress is
//! observed only through the [`SessionEvents`] stream returned by
//! [`SessionManager::start`]: zero or more `Output` events followed by exactly
//! one `Terminated` event.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Launching -> Running -> Completed | ManuallyTerminated | Failed
//!            \-> LaunchFailed
//! ```
//!
//! Terminal states never change. Every `start` gets a fresh handle and a fresh
//! output log.

mod error;
mod output_log;
mod spec;
mod termination;

pub use error::{CancelRejection, LaunchError, LaunchErrorKind, SessionError};
pub use output_log::{OutputChunk, OutputLog, StreamSource};
pub use spec::CommandSpec;
pub use termination::{Outcome, SIGTERM, TerminationResult};

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use chrono::{DateTime, Local};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::process::{ProcessControl, ProcessEvent, ProcessLauncher, TokioLauncher};

pub type SessionId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one launched process. Never reused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: SessionId,
    pub pid: u32,
    pub started_at: DateTime<Local>,
}

/// Where the manager's most recent session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Idle,
    Launching,
    Running,
    Completed,
    ManuallyTerminated,
    Failed,
    LaunchFailed,
}

impl SessionStatus {
    /// A session is active while its process may still produce output.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Launching | Self::Running)
    }
}

impl From<Outcome> for SessionStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::Completed,
            Outcome::ManuallyTerminated => Self::ManuallyTerminated,
            Outcome::Failed => Self::Failed,
        }
    }
}

/// Whether interrupting a command is safe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelPolicy {
    #[default]
    Cancellable,
    /// Killing the process mid-run corrupts what it writes (e.g. a sorted
    /// rainbow table). Cancel requests are rejected.
    NonCancellable,
}

/// Event delivered to the presentation layer, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Output(OutputChunk),
    /// Always the last event of a session
    Terminated(TerminationResult),
}

/// Ordered event stream of one session.
///
/// Ends after the `Terminated` event.
pub struct SessionEvents {
    rx: UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
    /// Wait for the next event. `None` once the session has terminated.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Drive the stream to the end, calling `on_output` for each chunk and
    /// `on_termination` once with the final result.
    pub async fn dispatch<O, T>(mut self, mut on_output: O, on_termination: T) -> Option<TerminationResult>
    where
        O: FnMut(&OutputChunk),
        T: FnOnce(&TerminationResult),
    {
        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::Output(chunk) => on_output(&chunk),
                SessionEvent::Terminated(result) => {
                    on_termination(&result);
                    return Some(result);
                }
            }
        }
        None
    }
}

impl Stream for SessionEvents {
    type Item = SessionEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

struct ActiveSession {
    handle: SessionHandle,
    policy: CancelPolicy,
    control: Box<dyn ProcessControl>,
}

#[derive(Default)]
struct SessionState {
    status: SessionStatus,
    active: Option<ActiveSession>,
    last_handle: Option<SessionHandle>,
    last_result: Option<TerminationResult>,
    log: Arc<Mutex<OutputLog>>,
}

/// Owns the session of one tool and its output log.
///
/// Managers share no state with each other, so several tools can run side by
/// side, each through its own manager.
pub struct SessionManager {
    launcher: Arc<dyn ProcessLauncher>,
    state: Arc<Mutex<SessionState>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Manager that launches real processes.
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(TokioLauncher::default()))
    }

    pub fn with_launcher(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Launch `spec` and return as soon as it has a pid.
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`SessionError::Busy`] while the previous session is still active and
    /// with [`SessionError::Launch`] when the program cannot be started.
    pub fn start(
        &self,
        spec: CommandSpec,
        policy: CancelPolicy,
    ) -> Result<(SessionHandle, SessionEvents), SessionError> {
        let log = {
            let mut state = lock(&self.state);
            if state.status.is_active() {
                warn!("Rejected start of '{}': session busy", spec.program);
                return Err(SessionError::Busy);
            }
            state.status = SessionStatus::Launching;
            state.active = None;
            state.last_handle = None;
            state.last_result = None;
            state.log = Arc::new(Mutex::new(OutputLog::new()));
            state.log.clone()
        };

        info!("Launching: {}", spec.display_line());
        let process = match self.launcher.launch(&spec) {
            Ok(process) => process,
            Err(e) => {
                warn!("{}", e);
                lock(&self.state).status = SessionStatus::LaunchFailed;
                return Err(e.into());
            }
        };

        let handle = SessionHandle {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            pid: process.pid,
            started_at: Local::now(),
        };
        info!(
            "Session {} running '{}' as pid {} ({:?})",
            handle.id, spec.program, handle.pid, policy
        );

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        {
            let mut state = lock(&self.state);
            state.status = SessionStatus::Running;
            state.last_handle = Some(handle.clone());
            state.active = Some(ActiveSession {
                handle: handle.clone(),
                policy,
                control: process.control,
            });
        }

        tokio::spawn(pump_events(
            handle.id,
            process.events,
            self.state.clone(),
            log,
            event_tx,
        ));

        Ok((handle, SessionEvents { rx: event_rx }))
    }

    /// Ask the running process to stop.
    ///
    /// The outcome arrives later as the `Terminated` event. Non-cancellable
    /// sessions are never signalled.
    pub fn cancel(&self, handle: &SessionHandle) -> Result<(), SessionError> {
        let state = lock(&self.state);

        let Some(active) = state.active.as_ref() else {
            let rejection = match &state.last_handle {
                Some(last) if last.id == handle.id => CancelRejection::AlreadyTerminated,
                _ => CancelRejection::UnknownSession,
            };
            warn!("Cancel of session {} rejected: {:?}", handle.id, rejection);
            return Err(SessionError::CancelRejected(rejection));
        };

        if active.handle.id != handle.id {
            warn!("Cancel of session {} rejected: not the running session", handle.id);
            return Err(SessionError::CancelRejected(CancelRejection::UnknownSession));
        }

        if active.policy == CancelPolicy::NonCancellable {
            warn!(
                "Cancel of session {} rejected: command must not be interrupted",
                handle.id
            );
            return Err(SessionError::CancelRejected(CancelRejection::NonCancellable));
        }

        info!("Cancelling session {} (pid {})", handle.id, active.handle.pid);
        active.control.terminate().map_err(|e| match e.kind() {
            // Exited but the exit report has not been folded in yet
            std::io::ErrorKind::NotConnected => {
                SessionError::CancelRejected(CancelRejection::AlreadyTerminated)
            }
            _ => SessionError::Signal(e.to_string()),
        })
    }

    /// Empty the output log. Rejected while a session is active.
    pub fn clear_log(&self) -> Result<(), SessionError> {
        let state = lock(&self.state);
        if state.status.is_active() {
            return Err(SessionError::LogInUse);
        }
        let mut log = lock(&state.log);
        if !log.is_empty() {
            debug!("Output log cleared ({} chunks)", log.len());
            log.clear();
        }
        Ok(())
    }

    /// Copy of the output log in arrival order.
    pub fn log_snapshot(&self) -> Vec<OutputChunk> {
        let log = lock(&self.state).log.clone();
        lock(&log).chunks().to_vec()
    }

    pub fn status(&self) -> SessionStatus {
        lock(&self.state).status
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Handle of the running session, if any.
    pub fn current_handle(&self) -> Option<SessionHandle> {
        lock(&self.state).active.as_ref().map(|a| a.handle.clone())
    }

    /// Handle of the most recent launched session, running or finished.
    pub fn last_handle(&self) -> Option<SessionHandle> {
        lock(&self.state).last_handle.clone()
    }

    /// Whether a cancel affordance should be offered right now.
    pub fn can_cancel(&self) -> bool {
        lock(&self.state)
            .active
            .as_ref()
            .is_some_and(|a| a.policy == CancelPolicy::Cancellable)
    }

    /// Result of the most recent session that reached a terminal state.
    pub fn last_result(&self) -> Option<TerminationResult> {
        lock(&self.state).last_result
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Nothing here leaves the state half-written on panic
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Folds process events into the log and forwards them to the subscriber.
async fn pump_events(
    session_id: SessionId,
    mut events: UnboundedReceiver<ProcessEvent>,
    state: Arc<Mutex<SessionState>>,
    log: Arc<Mutex<OutputLog>>,
    subscriber: UnboundedSender<SessionEvent>,
) {
    let mut exit = None;

    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Output { source, text } => {
                let chunk = lock(&log).append(source, text);
                if subscriber.send(SessionEvent::Output(chunk)).is_err() {
                    // Keep recording even when nobody watches the stream
                    debug!("Session {} output not delivered, subscriber dropped", session_id);
                }
            }
            ProcessEvent::Exited { exit_code, signal } => {
                exit = Some(TerminationResult::classify(exit_code, signal));
                break;
            }
        }
    }

    let result = exit.unwrap_or_else(|| {
        warn!("Session {} event stream closed without an exit report", session_id);
        TerminationResult::classify(None, None)
    });

    {
        let mut state = lock(&state);
        if state.active.as_ref().is_some_and(|a| a.handle.id == session_id) {
            state.active = None;
            state.status = result.outcome().into();
            state.last_result = Some(result);
        }
    }
    info!("Session {} finished: {}", session_id, result);

    if subscriber.send(SessionEvent::Terminated(result)).is_err() {
        debug!("Session {} termination not delivered, subscriber dropped", session_id);
    }
}
