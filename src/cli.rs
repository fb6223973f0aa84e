use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::tools::{FOREMOST_BINARY, ForemostOptions, RTSORT_BINARY, RtsortOptions, ToolPreset};

/// CLI arguments for forensic-console
#[derive(Debug, Parser)]
#[command(name = "forensic-console")]
#[command(about = "Run forensic command-line tools and stream their output")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: ToolCommand,

    /// Run the tool from this directory
    #[arg(long, global = true, value_name = "DIR", env = "FORENSIC_CONSOLE_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Directory for log files (defaults to logs/ next to the executable)
    #[arg(long, global = true, value_name = "DIR", env = "FORENSIC_CONSOLE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print a JSON summary line after the run
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum ToolCommand {
    /// Recover files from an image or device by header/footer carving
    Foremost(ForemostArgs),
    /// Sort RainbowCrack tables (cannot be cancelled once started)
    Rtsort(RtsortArgs),
}

#[derive(Debug, Args)]
pub struct ForemostArgs {
    /// Input file or device, e.g. /path/to/file.dd
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: String,

    /// Output directory for recovered files
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: String,

    /// Configuration file (defaults to foremost.conf)
    #[arg(short = 'c', long, value_name = "FILE", default_value = "")]
    pub config: String,

    /// Quiet mode, suppress output messages
    #[arg(short = 'Q', long)]
    pub quiet: bool,

    /// Verbose mode, log all messages to screen
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Comma-separated file types, e.g. jpg,doc (all types when omitted)
    #[arg(short = 't', long, value_name = "TYPES", default_value = "")]
    pub types: String,

    /// Enable the advanced switches below
    #[arg(long)]
    pub advanced: bool,

    /// Indirect block detection (for UNIX file systems)
    #[arg(short = 'd', long, requires = "advanced")]
    pub indirect_block_detection: bool,

    /// Write all headers, perform no error detection
    #[arg(short = 'a', long, requires = "advanced")]
    pub all_headers: bool,

    /// Only write the audit file
    #[arg(short = 'w', long, requires = "advanced")]
    pub audit_file_only: bool,

    /// Quick mode, search on 512 byte boundaries
    #[arg(short = 'q', long, requires = "advanced")]
    pub quick_mode: bool,

    /// Binary to run instead of `foremost` from PATH
    #[arg(long, value_name = "PATH", env = "FORENSIC_CONSOLE_FOREMOST", default_value = FOREMOST_BINARY)]
    pub binary: String,
}

#[derive(Debug, Args)]
pub struct RtsortArgs {
    /// Rainbow table file or directory
    #[arg(default_value = "./")]
    pub path: String,

    /// Binary to run instead of `rtsort` from PATH
    #[arg(long, value_name = "PATH", env = "FORENSIC_CONSOLE_RTSORT", default_value = RTSORT_BINARY)]
    pub binary: String,
}

impl ToolCommand {
    /// The tool preset and the binary that should run it.
    pub fn into_preset(self) -> (Box<dyn ToolPreset + Send>, String) {
        match self {
            ToolCommand::Foremost(args) => {
                let options = ForemostOptions {
                    input: args.input,
                    output_dir: args.output_dir,
                    config: args.config,
                    quiet: args.quiet,
                    verbose: args.verbose,
                    types: args.types,
                    advanced: args.advanced,
                    indirect_block_detection: args.indirect_block_detection,
                    all_headers: args.all_headers,
                    audit_file_only: args.audit_file_only,
                    quick_mode: args.quick_mode,
                };
                (Box::new(options), args.binary)
            }
            ToolCommand::Rtsort(args) => {
                (Box::new(RtsortOptions { path: args.path }), args.binary)
            }
        }
    }
}
