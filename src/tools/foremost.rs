//! `foremost` file carving.
//!
//! Carving only reads the input image and writes fresh files into the output
//! directory, so stopping it early is safe.

use serde::{Deserialize, Serialize};

use super::ToolPreset;
use crate::session::{CancelPolicy, CommandSpec};

pub const FOREMOST_BINARY: &str = "foremost";

/// Options for a foremost run.
///
/// The advanced switches are only emitted when `advanced` is set, so toggling
/// advanced mode off never leaks a previously ticked flag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForemostOptions {
    /// Image file or device to carve (`-i`)
    pub input: String,
    /// Directory that receives recovered files (`-o`)
    pub output_dir: String,
    /// Configuration file (`-c`), foremost.conf when blank
    pub config: String,
    /// Suppress output messages (`-Q`)
    pub quiet: bool,
    /// Log all messages to screen (`-v`)
    pub verbose: bool,
    /// Comma-separated built-in types (`-t`), all types when blank
    pub types: String,
    pub advanced: bool,
    /// Indirect block detection for UNIX file systems (`-d`)
    pub indirect_block_detection: bool,
    /// Write all headers, no error detection (`-a`)
    pub all_headers: bool,
    /// Only write the audit file (`-w`)
    pub audit_file_only: bool,
    /// Search on 512 byte boundaries (`-q`)
    pub quick_mode: bool,
}

impl ToolPreset for ForemostOptions {
    fn title(&self) -> &'static str {
        "Foremost"
    }

    fn command_spec(&self, program: &str) -> CommandSpec {
        let advanced = self.advanced;
        CommandSpec::new(program)
            .args(["-i", self.input.as_str(), "-o", self.output_dir.as_str()])
            .option_if_set("-c", &self.config)
            .flag_if(self.quiet, "-Q")
            .flag_if(self.verbose, "-v")
            .option_if_set("-t", &self.types)
            .flag_if(advanced && self.indirect_block_detection, "-d")
            .flag_if(advanced && self.all_headers, "-a")
            .flag_if(advanced && self.audit_file_only, "-w")
            .flag_if(advanced && self.quick_mode, "-q")
    }

    fn cancel_policy(&self) -> CancelPolicy {
        CancelPolicy::Cancellable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> ForemostOptions {
        ForemostOptions {
            input: "/evidence/disk.dd".to_string(),
            output_dir: "/cases/42".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_command() {
        let spec = basic().command_spec(FOREMOST_BINARY);
        assert_eq!(spec.program, "foremost");
        assert_eq!(spec.launch_args(), vec!["-i", "/evidence/disk.dd", "-o", "/cases/42"]);
    }

    #[test]
    fn test_all_switches_in_order() {
        let options = ForemostOptions {
            config: "custom.conf".to_string(),
            quiet: true,
            verbose: true,
            types: "jpg,doc".to_string(),
            advanced: true,
            indirect_block_detection: true,
            all_headers: true,
            audit_file_only: true,
            quick_mode: true,
            ..basic()
        };

        let spec = options.command_spec(FOREMOST_BINARY);
        assert_eq!(
            spec.launch_args(),
            vec![
                "-i", "/evidence/disk.dd", "-o", "/cases/42", "-c", "custom.conf", "-Q", "-v",
                "-t", "jpg,doc", "-d", "-a", "-w", "-q"
            ]
        );
    }

    #[test]
    fn test_advanced_flags_ignored_outside_advanced_mode() {
        let options = ForemostOptions {
            indirect_block_detection: true,
            all_headers: true,
            audit_file_only: true,
            quick_mode: true,
            ..basic()
        };

        let args = options.command_spec(FOREMOST_BINARY).launch_args().join(" ");
        assert_eq!(args, "-i /evidence/disk.dd -o /cases/42");
    }

    #[test]
    fn test_blank_input_is_dropped_at_launch() {
        let options = ForemostOptions {
            output_dir: "out".to_string(),
            ..Default::default()
        };
        assert_eq!(
            options.command_spec(FOREMOST_BINARY).launch_args(),
            vec!["-i", "-o", "out"]
        );
    }

    #[test]
    fn test_foremost_is_cancellable() {
        assert_eq!(basic().cancel_policy(), CancelPolicy::Cancellable);
    }
}
