//! Scripted stand-in for a real process, used by the session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedSender};

use super::{LaunchedProcess, ProcessControl, ProcessEvent, ProcessLauncher};
use crate::session::{CommandSpec, LaunchError, LaunchErrorKind, StreamSource, SIGTERM};

/// What the fake process does once launched.
#[derive(Clone, Debug)]
pub enum Script {
    /// Emit these events right away, then close the stream.
    Replay(Vec<ProcessEvent>),
    /// Emit these events, then stay running until terminated.
    /// Termination produces an exit with SIGTERM.
    RunUntilTerminated(Vec<ProcessEvent>),
    /// Refuse to start.
    LaunchFails(LaunchErrorKind),
}

pub fn stdout(text: &str) -> ProcessEvent {
    ProcessEvent::Output {
        source: StreamSource::Stdout,
        text: text.to_string(),
    }
}

pub fn stderr(text: &str) -> ProcessEvent {
    ProcessEvent::Output {
        source: StreamSource::Stderr,
        text: text.to_string(),
    }
}

pub fn exited(exit_code: Option<i32>, signal: Option<i32>) -> ProcessEvent {
    ProcessEvent::Exited { exit_code, signal }
}

pub struct ScriptedLauncher {
    script: Script,
    launched: Mutex<Vec<Vec<String>>>,
    terminate_requests: Arc<AtomicUsize>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            launched: Mutex::new(Vec::new()),
            terminate_requests: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Argument vectors of every launch, as the process would have seen them.
    pub fn launched_args(&self) -> Vec<Vec<String>> {
        self.launched
            .lock()
            .map(|launched| launched.clone())
            .unwrap_or_default()
    }

    pub fn terminate_requests(&self) -> usize {
        self.terminate_requests.load(Ordering::SeqCst)
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(&self, spec: &CommandSpec) -> Result<LaunchedProcess, LaunchError> {
        if let Script::LaunchFails(kind) = self.script {
            return Err(LaunchError {
                program: spec.program.clone(),
                kind,
                message: "scripted launch failure".to_string(),
            });
        }

        if let Ok(mut launched) = self.launched.lock() {
            launched.push(spec.launch_args().into_iter().map(String::from).collect());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let held = match &self.script {
            Script::Replay(events) => {
                for event in events {
                    if tx.send(event.clone()).is_err() {
                        break;
                    }
                }
                None
            }
            Script::RunUntilTerminated(events) => {
                for event in events {
                    if tx.send(event.clone()).is_err() {
                        break;
                    }
                }
                Some(tx)
            }
            Script::LaunchFails(_) => None,
        };

        Ok(LaunchedProcess {
            pid: 4242,
            events: rx,
            control: Box::new(ScriptedControl {
                running: Mutex::new(held),
                terminate_requests: self.terminate_requests.clone(),
            }),
        })
    }
}

struct ScriptedControl {
    running: Mutex<Option<UnboundedSender<ProcessEvent>>>,
    terminate_requests: Arc<AtomicUsize>,
}

impl ProcessControl for ScriptedControl {
    fn terminate(&self) -> std::io::Result<()> {
        self.terminate_requests.fetch_add(1, Ordering::SeqCst);
        let sender = self.running.lock().ok().and_then(|mut running| running.take());
        match sender {
            Some(tx) => {
                if tx.send(exited(None, Some(SIGTERM))).is_err() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::NotConnected,
                        "scripted process already exited",
                    ));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}
