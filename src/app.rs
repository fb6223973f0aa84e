//! Application run loop.
//!
//! The App owns the session manager for the selected tool and the console it
//! renders to. It starts one session, streams its events, and maps Ctrl-C to
//! a cancel request.

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::console::{Console, RunSummary};
use crate::session::{
    CancelPolicy, CancelRejection, CommandSpec, Outcome, SessionError, SessionEvent,
    SessionHandle, SessionManager, TerminationResult,
};

pub struct App<W: Write> {
    manager: SessionManager,
    console: Console<W>,
    title: &'static str,
    spec: CommandSpec,
    policy: CancelPolicy,
    json: bool,
}

impl App<std::io::Stdout> {
    pub fn from_cli(cli: Cli) -> Self {
        let Cli {
            command,
            workdir,
            json,
            no_color,
            ..
        } = cli;

        let (preset, binary) = command.into_preset();
        let mut spec = preset.command_spec(&binary);
        if let Some(dir) = workdir {
            spec = spec.current_dir(dir);
        }

        Self::new(
            SessionManager::new(),
            Console::stdout(!no_color),
            preset.title(),
            spec,
            preset.cancel_policy(),
            json,
        )
    }
}

impl<W: Write> App<W> {
    pub fn new(
        manager: SessionManager,
        console: Console<W>,
        title: &'static str,
        spec: CommandSpec,
        policy: CancelPolicy,
        json: bool,
    ) -> Self {
        Self {
            manager,
            console,
            title,
            spec,
            policy,
            json,
        }
    }

    /// Run the tool to completion and map its outcome to the exit code.
    pub async fn run(mut self) -> Result<ExitCode> {
        self.console.header(self.title, &self.spec)?;

        let (handle, mut events) = match self.manager.start(self.spec.clone(), self.policy) {
            Ok(started) => started,
            Err(SessionError::Launch(e)) => {
                self.console.notice(&e.to_string())?;
                self.finish(None)?;
                return Ok(ExitCode::from(127));
            }
            Err(e) => return Err(e).context("Failed to start session"),
        };
        self.console.started(&handle, self.manager.can_cancel())?;

        let mut result = None;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Output(chunk)) => self.console.output(&chunk)?,
                    Some(SessionEvent::Terminated(done)) => {
                        self.console.status(&done)?;
                        result = Some(done);
                    }
                    None => break,
                },
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Ctrl-C handler unavailable: {}", e);
                        continue;
                    }
                    self.on_interrupt(&handle)?;
                }
            }
        }

        self.finish(result)?;
        Ok(exit_code(result))
    }

    fn on_interrupt(&mut self, handle: &SessionHandle) -> Result<()> {
        info!("Interrupt received for session {}", handle.id);
        match self.manager.cancel(handle) {
            Ok(()) => self
                .console
                .notice("Cancel requested, waiting for the process to stop"),
            Err(SessionError::CancelRejected(CancelRejection::NonCancellable)) => self.console.notice(
                "This command must not be interrupted, stopping it would corrupt its output. Waiting for it to finish.",
            ),
            Err(e) => self.console.notice(&e.to_string()),
        }
    }

    fn finish(&mut self, result: Option<TerminationResult>) -> Result<()> {
        if !self.json {
            return Ok(());
        }
        let summary = RunSummary {
            tool: self.title.to_string(),
            command: self.spec.clone(),
            session: self.manager.last_handle(),
            status: self.manager.status(),
            result,
        };
        self.console.summary_json(&summary)
    }
}

/// Process exit code for the console itself.
fn exit_code(result: Option<TerminationResult>) -> ExitCode {
    match result.map(|r| r.outcome()) {
        Some(Outcome::Success) => ExitCode::SUCCESS,
        Some(Outcome::ManuallyTerminated) => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    }
}
