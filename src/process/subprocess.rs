//! Real process launcher built on `tokio::process`.
//!
//! Each launch spawns three tasks: one reader per output pipe and a waiter
//! that owns the child. The waiter only reports the exit after both readers
//! hit EOF, so the exit event always trails the last output chunk.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::{LaunchedProcess, ProcessControl, ProcessEvent, ProcessLauncher};
use crate::session::{CommandSpec, LaunchError, LaunchErrorKind, StreamSource, TerminationResult};

const PIPE_READ_BUFFER: usize = 8192; // 8KB per read, tools print line-sized progress
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Launches programs as child processes with piped stdout and stderr.
#[derive(Clone, Debug)]
pub struct TokioLauncher {
    read_buffer: usize,
    drain_timeout: Duration,
}

impl Default for TokioLauncher {
    fn default() -> Self {
        Self {
            read_buffer: PIPE_READ_BUFFER,
            drain_timeout: OUTPUT_DRAIN_TIMEOUT,
        }
    }
}

impl TokioLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to keep reading pipes after the child exited.
    ///
    /// A grandchild that inherited the pipes can keep them open after the
    /// child is gone; readers are abandoned once this elapses.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }
}

impl ProcessLauncher for TokioLauncher {
    fn launch(&self, spec: &CommandSpec) -> Result<LaunchedProcess, LaunchError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(spec.launch_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        // Own process group: a Ctrl-C at the console must not reach the tool
        // directly, cancellation goes through the session manager.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| LaunchError::from_io(&spec.program, &e))?;

        let pid = child.id().ok_or_else(|| LaunchError {
            program: spec.program.clone(),
            kind: LaunchErrorKind::Other,
            message: "process exited before reporting a pid".to_string(),
        })?;

        let (event_tx, event_rx) = mpsc::unbounded_channel::<ProcessEvent>();
        let (terminate_tx, terminate_rx) = mpsc::unbounded_channel::<()>();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(read_pipe(
                stdout,
                StreamSource::Stdout,
                event_tx.clone(),
                self.read_buffer,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(read_pipe(
                stderr,
                StreamSource::Stderr,
                event_tx.clone(),
                self.read_buffer,
            )));
        }

        tokio::spawn(wait_for_exit(
            child,
            pid,
            readers,
            terminate_rx,
            event_tx,
            self.drain_timeout,
        ));

        Ok(LaunchedProcess {
            pid,
            events: event_rx,
            control: Box::new(ChildControl { terminate_tx }),
        })
    }
}

/// Forwards terminate requests to the waiter task that owns the child.
///
/// Routing through the waiter means the signal is only ever sent while the
/// child has not been reaped, so a recycled pid is never hit.
struct ChildControl {
    terminate_tx: UnboundedSender<()>,
}

impl ProcessControl for ChildControl {
    fn terminate(&self) -> std::io::Result<()> {
        self.terminate_tx.send(()).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "process already exited")
        })
    }
}

async fn wait_for_exit(
    mut child: Child,
    pid: u32,
    readers: Vec<JoinHandle<()>>,
    mut terminate_rx: UnboundedReceiver<()>,
    event_tx: UnboundedSender<ProcessEvent>,
    drain_timeout: Duration,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(()) = terminate_rx.recv() => send_terminate(&mut child, pid),
        }
    };

    // Flush whatever is still sitting in the pipes before reporting the exit
    let aborts: Vec<_> = readers.iter().map(JoinHandle::abort_handle).collect();
    let drained = tokio::time::timeout(drain_timeout, async {
        for reader in readers {
            if let Err(e) = reader.await {
                warn!("Pipe reader for pid {} ended abnormally: {}", pid, e);
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("Output pipes of pid {} still open after exit, abandoning readers", pid);
        for abort in aborts {
            abort.abort();
        }
    }

    let event = match status {
        Ok(status) => {
            let result = TerminationResult::from_exit_status(status);
            ProcessEvent::Exited {
                exit_code: result.exit_code(),
                signal: result.signal(),
            }
        }
        Err(e) => {
            error!("Failed to wait on pid {}: {}", pid, e);
            ProcessEvent::Exited {
                exit_code: None,
                signal: None,
            }
        }
    };

    if event_tx.send(event).is_err() {
        debug!("Exit of pid {} not delivered, receiver dropped", pid);
    }
}

#[cfg(unix)]
fn send_terminate(_child: &mut Child, pid: u32) {
    // The child leads its own process group (see `launch`), so a negative pid
    // reaches the whole tool tree, including anything a wrapper script forked.
    // SAFETY: kill(2) has no memory-safety preconditions; the group is still
    // ours because its leader has not been waited on yet.
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGTERM) };
    if rc != 0 {
        warn!(
            "Failed to send SIGTERM to process group {}: {}",
            pid,
            std::io::Error::last_os_error()
        );
    } else {
        debug!("Sent SIGTERM to process group {}", pid);
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child, pid: u32) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to kill pid {}: {}", pid, e);
    }
}

async fn read_pipe<R>(
    mut reader: R,
    source: StreamSource,
    event_tx: UnboundedSender<ProcessEvent>,
    buffer_size: usize,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    let mut decoder = Utf8Decoder::default();

    loop {
        match reader.read(&mut buf).await {
            // EOF: the write end is closed
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.decode(&buf[..n]);
                if text.is_empty() {
                    continue;
                }
                if event_tx.send(ProcessEvent::Output { source, text }).is_err() {
                    // Receiver dropped, nobody is listening anymore
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Read error on {:?}: {}", source, e);
                break;
            }
        }
    }

    let rest = decoder.finish();
    if !rest.is_empty() && event_tx.send(ProcessEvent::Output { source, text: rest }).is_err() {
        debug!("Trailing {:?} output dropped, receiver gone", source);
    }
}

/// Incremental UTF-8 decoder that keeps split multi-byte sequences intact
/// across reads. Invalid bytes become U+FFFD.
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more bytes
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    fn finish(self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }
}
