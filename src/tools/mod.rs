//! Presets for the external tools the console drives.
//!
//! Each preset turns operator-facing options into a [`CommandSpec`] whose
//! switches map 1:1 to the tool's documented command line, and declares
//! whether the tool may be interrupted.

mod foremost;
mod rtsort;

pub use foremost::{FOREMOST_BINARY, ForemostOptions};
pub use rtsort::{RTSORT_BINARY, RtsortOptions};

use crate::session::{CancelPolicy, CommandSpec};

/// An external tool invocation built from operator options.
pub trait ToolPreset {
    /// Display name shown in the console header.
    fn title(&self) -> &'static str;

    /// Build the command for `program` (normally the tool's binary name).
    fn command_spec(&self, program: &str) -> CommandSpec;

    fn cancel_policy(&self) -> CancelPolicy;
}
