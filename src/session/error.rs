//! Error taxonomy for launching and steering sessions.
//!
//! Only synchronous failures live here. Anything that goes wrong after the
//! process is running is reported through the termination event instead.

use thiserror::Error;

/// Why the OS refused to start the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchErrorKind {
    NotFound,
    PermissionDenied,
    Other,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("failed to launch '{program}': {message}")]
pub struct LaunchError {
    pub program: String,
    pub kind: LaunchErrorKind,
    pub message: String,
}

impl LaunchError {
    pub fn from_io(program: &str, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => LaunchErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => LaunchErrorKind::PermissionDenied,
            _ => LaunchErrorKind::Other,
        };
        Self {
            program: program.to_string(),
            kind,
            message: err.to_string(),
        }
    }
}

/// Why a cancel request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelRejection {
    /// Interrupting this command would leave its on-disk output corrupted.
    NonCancellable,
    /// The session already reached a terminal state.
    AlreadyTerminated,
    /// The handle does not belong to this manager's current session.
    UnknownSession,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("a session is already running for this tool")]
    Busy,
    #[error("cancel rejected: {0:?}")]
    CancelRejected(CancelRejection),
    #[error("output log belongs to a running session and cannot be cleared")]
    LogInUse,
    #[error("failed to signal process: {0}")]
    Signal(String),
}
