//! forensic-console - run forensic command-line tools and stream their output
//!
//! This library provides:
//! - Session management for one long-running external process at a time
//! - A process boundary that can be swapped for a scripted fake in tests
//! - Presets that map operator options to `foremost` and `rtsort` switches
//! - A line-oriented console that renders a session
//!
//! # Example
//!
//! ```no_run
//! use forensic_console::session::{CancelPolicy, CommandSpec, SessionEvent, SessionManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = SessionManager::new();
//!     let spec = CommandSpec::new("rtsort").arg("/tables/ntlm.rt");
//!
//!     let (_handle, mut events) = manager
//!         .start(spec, CancelPolicy::NonCancellable)
//!         .unwrap();
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SessionEvent::Output(chunk) => print!("{}", chunk.text),
//!             SessionEvent::Terminated(result) => println!("{}", result),
//!         }
//!     }
//! }
//! ```

pub mod app;
pub mod cli;
pub mod console;
pub mod process;
pub mod session;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use session::{
    CancelPolicy, CommandSpec, Outcome, SessionError, SessionEvent, SessionEvents, SessionHandle,
    SessionManager, SessionStatus, TerminationResult,
};
pub use tools::{ForemostOptions, RtsortOptions, ToolPreset};
