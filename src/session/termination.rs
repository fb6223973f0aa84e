//! Terminal classification of a finished process.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal number the console sends when the operator cancels a session.
pub const SIGTERM: i32 = 15;

/// Final outcome of a session that reached `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    ManuallyTerminated,
    Failed,
}

/// How the process ended. Immutable once produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationResult {
    exit_code: Option<i32>,
    signal: Option<i32>,
    outcome: Outcome,
}

impl TerminationResult {
    /// Classify a raw exit report.
    ///
    /// Exit code 0 is success. Otherwise SIGTERM means the operator stopped
    /// the process. Anything else, including a report with neither a code nor
    /// a signal, is a failure.
    pub fn classify(exit_code: Option<i32>, signal: Option<i32>) -> Self {
        let outcome = match (exit_code, signal) {
            (Some(0), _) => Outcome::Success,
            (_, Some(SIGTERM)) => Outcome::ManuallyTerminated,
            _ => Outcome::Failed,
        };
        Self {
            exit_code,
            signal,
            outcome,
        }
    }

    /// Build from a std exit status, pulling the signal out on Unix.
    pub fn from_exit_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self::classify(status.code(), signal)
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn signal(&self) -> Option<i32> {
        self.signal
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

impl fmt::Display for TerminationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Success => write!(f, "Process completed successfully."),
            Outcome::ManuallyTerminated => write!(f, "Process was manually terminated."),
            Outcome::Failed => write!(
                f,
                "Process terminated with exit code: {} and signal code: {}",
                self.exit_code.unwrap_or(0),
                self.signal.unwrap_or(0)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_exit_is_success() {
        let result = TerminationResult::classify(Some(0), None);
        assert_eq!(result.outcome(), Outcome::Success);
        assert!(result.is_success());
    }

    #[test]
    fn test_sigterm_is_manual_termination() {
        // Unix reports no exit code for a signalled process
        let result = TerminationResult::classify(None, Some(SIGTERM));
        assert_eq!(result.outcome(), Outcome::ManuallyTerminated);

        let result = TerminationResult::classify(Some(143), Some(SIGTERM));
        assert_eq!(result.outcome(), Outcome::ManuallyTerminated);
    }

    #[test]
    fn test_other_endings_fail_with_values_kept() {
        let cases = vec![
            (Some(1), None),
            (Some(2), Some(9)),
            (None, Some(9)),
            (None, Some(2)),
            (None, None),
        ];

        for (code, signal) in cases {
            let result = TerminationResult::classify(code, signal);
            assert_eq!(result.outcome(), Outcome::Failed, "code {:?} signal {:?}", code, signal);
            assert_eq!(result.exit_code(), code);
            assert_eq!(result.signal(), signal);
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            TerminationResult::classify(Some(0), None).to_string(),
            "Process completed successfully."
        );
        assert_eq!(
            TerminationResult::classify(None, Some(15)).to_string(),
            "Process was manually terminated."
        );
        assert_eq!(
            TerminationResult::classify(Some(3), None).to_string(),
            "Process terminated with exit code: 3 and signal code: 0"
        );
        assert_eq!(
            TerminationResult::classify(None, Some(9)).to_string(),
            "Process terminated with exit code: 0 and signal code: 9"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_from_exit_status_reads_signal() {
        use std::os::unix::process::ExitStatusExt;

        // Raw wait status: low 7 bits carry the terminating signal
        let status = std::process::ExitStatus::from_raw(SIGTERM);
        let result = TerminationResult::from_exit_status(status);
        assert_eq!(result.signal(), Some(SIGTERM));
        assert_eq!(result.exit_code(), None);
        assert_eq!(result.outcome(), Outcome::ManuallyTerminated);

        let status = std::process::ExitStatus::from_raw(2 << 8);
        let result = TerminationResult::from_exit_status(status);
        assert_eq!(result.exit_code(), Some(2));
        assert_eq!(result.outcome(), Outcome::Failed);
    }
}
