//! Command description handed to the session manager.
//!
//! A `CommandSpec` is the program name plus its ordered argument tokens. Each
//! token is passed to the program as-is; no shell splitting or quoting happens.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// An external program invocation: program, ordered arguments, optional cwd.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append one argument token.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several argument tokens in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag` only when `enabled` is true.
    pub fn flag_if(self, enabled: bool, flag: &str) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    /// Append `flag value` only when `value` is non-blank.
    pub fn option_if_set(self, flag: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self
        } else {
            self.arg(flag).arg(value)
        }
    }

    /// Run the program from `dir` instead of the caller's working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The argument vector that is actually passed to the process.
    ///
    /// Empty-string tokens mean "no value" and are never forwarded.
    pub fn launch_args(&self) -> Vec<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|arg| !arg.is_empty())
            .collect()
    }

    /// Human readable command line, used for logging and the console header.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.launch_args() {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('\'');
                line.push_str(arg);
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}
