//! Line-oriented console that renders a session for the operator.
//!
//! Output chunks are written as they arrive. The final status line is styled
//! per outcome so "I stopped it" never looks like "it broke".

use std::io::Write;

use anyhow::Result;
use crossterm::style::Stylize;
use serde::Serialize;

use crate::session::{
    CommandSpec, OutputChunk, Outcome, SessionHandle, SessionStatus, StreamSource,
    TerminationResult,
};

pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl Console<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(std::io::stdout(), color)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Tool title and the exact command line about to run.
    pub fn header(&mut self, title: &str, spec: &CommandSpec) -> Result<()> {
        if self.color {
            writeln!(self.out, "{}", title.bold())?;
            writeln!(self.out, "{}", format!("$ {}", spec.display_line()).dim())?;
        } else {
            writeln!(self.out, "{}", title)?;
            writeln!(self.out, "$ {}", spec.display_line())?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn started(&mut self, handle: &SessionHandle, can_cancel: bool) -> Result<()> {
        let hint = if can_cancel {
            "press Ctrl-C to cancel"
        } else {
            "this command cannot be cancelled"
        };
        self.notice(&format!("Started pid {} ({})", handle.pid, hint))
    }

    pub fn output(&mut self, chunk: &OutputChunk) -> Result<()> {
        match (chunk.source, self.color) {
            (StreamSource::Stderr, true) => write!(self.out, "{}", chunk.text.as_str().dark_yellow())?,
            _ => write!(self.out, "{}", chunk.text)?,
        }
        self.out.flush()?;
        Ok(())
    }

    /// A message from the console itself rather than the tool.
    pub fn notice(&mut self, message: &str) -> Result<()> {
        if self.color {
            writeln!(self.out, "{}", format!("[console] {}", message).cyan())?;
        } else {
            writeln!(self.out, "[console] {}", message)?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn status(&mut self, result: &TerminationResult) -> Result<()> {
        let line = result.to_string();
        if self.color {
            let styled = match result.outcome() {
                Outcome::Success => line.green(),
                Outcome::ManuallyTerminated => line.yellow(),
                Outcome::Failed => line.red().bold(),
            };
            writeln!(self.out, "\n{}", styled)?;
        } else {
            writeln!(self.out, "\n{}", line)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Machine-readable summary of a finished run, one JSON object per line.
    pub fn summary_json(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(self.out, "{}", serde_json::to_string(summary)?)?;
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

/// What the `--json` flag prints once the session is over.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub command: CommandSpec,
    pub session: Option<SessionHandle>,
    pub status: SessionStatus,
    pub result: Option<TerminationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Console<Vec<u8>> {
        Console::new(Vec::new(), false)
    }

    fn rendered(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_header_shows_command_line() {
        let mut console = plain();
        let spec = CommandSpec::new("rtsort").arg("./tables");
        console.header("Rainbow Table Sort (rtsort)", &spec).unwrap();

        assert_eq!(rendered(console), "Rainbow Table Sort (rtsort)\n$ rtsort ./tables\n");
    }

    #[test]
    fn test_output_written_verbatim() {
        let mut console = plain();
        console
            .output(&OutputChunk {
                seq: 0,
                source: StreamSource::Stdout,
                text: "Processing: disk.dd\n".to_string(),
            })
            .unwrap();
        console
            .output(&OutputChunk {
                seq: 1,
                source: StreamSource::Stderr,
                text: "ERROR: short read\n".to_string(),
            })
            .unwrap();

        assert_eq!(rendered(console), "Processing: disk.dd\nERROR: short read\n");
    }

    #[test]
    fn test_status_lines_distinguish_outcomes() {
        let mut console = plain();
        console.status(&TerminationResult::classify(Some(0), None)).unwrap();
        console.status(&TerminationResult::classify(None, Some(15))).unwrap();
        console.status(&TerminationResult::classify(Some(1), None)).unwrap();

        let text = rendered(console);
        assert!(text.contains("Process completed successfully."));
        assert!(text.contains("Process was manually terminated."));
        assert!(text.contains("Process terminated with exit code: 1 and signal code: 0"));
    }

    #[test]
    fn test_colored_status_uses_ansi() {
        let mut console = Console::new(Vec::new(), true);
        console.status(&TerminationResult::classify(Some(2), None)).unwrap();
        assert!(rendered(console).contains('\x1b'));
    }

    #[test]
    fn test_summary_json() {
        let mut console = plain();
        let summary = RunSummary {
            tool: "Foremost".to_string(),
            command: CommandSpec::new("foremost").args(["-i", "a.dd", "-o", "out"]),
            session: None,
            status: SessionStatus::LaunchFailed,
            result: None,
        };
        console.summary_json(&summary).unwrap();

        let value: serde_json::Value = serde_json::from_str(rendered(console).trim()).unwrap();
        assert_eq!(value["tool"], "Foremost");
        assert_eq!(value["status"], "LaunchFailed");
        assert_eq!(value["command"]["args"][1], "a.dd");
        assert!(value["result"].is_null());
    }
}
