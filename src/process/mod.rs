//! Process invocation boundary.
//!
//! The session manager never touches OS process APIs directly. It asks a
//! [`ProcessLauncher`] to start a [`CommandSpec`] and gets back the pid, an
//! ordered event stream, and a control used to request termination.
//!
//! Contract every launcher must honour:
//! - `Output` events arrive in the order the pipes delivered them.
//! - At most one `Exited` event is sent, and it is the last event.

mod subprocess;
#[cfg(test)]
pub(crate) mod scripted;

pub use subprocess::TokioLauncher;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::session::{CommandSpec, LaunchError, StreamSource};

/// Raw event reported by a launched process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk of text read from one of the output pipes
    Output { source: StreamSource, text: String },
    /// The process ended; no more events follow
    Exited {
        exit_code: Option<i32>,
        signal: Option<i32>,
    },
}

/// Handle used to ask a running process to stop.
pub trait ProcessControl: Send + Sync {
    /// Request termination (SIGTERM on Unix).
    ///
    /// Returns an error if the process is already gone. Success only means
    /// the request was delivered; the outcome shows up as an `Exited` event.
    fn terminate(&self) -> std::io::Result<()>;
}

/// A process that started successfully.
pub struct LaunchedProcess {
    pub pid: u32,
    pub events: UnboundedReceiver<ProcessEvent>,
    pub control: Box<dyn ProcessControl>,
}

/// Starts external programs.
pub trait ProcessLauncher: Send + Sync {
    /// Launch `spec` without waiting for it to finish.
    fn launch(&self, spec: &CommandSpec) -> Result<LaunchedProcess, LaunchError>;
}
