//! Main entry point for forensic-console.
//!
//! Parses the command line, sets up file logging, and runs the selected tool
//! until its session terminates.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use forensic_console::app::App;
use forensic_console::cli::Cli;
use forensic_console::utils;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging before anything else
    utils::logger::init_logging(cli.log_dir.as_deref());

    App::from_cli(cli).run().await
}
