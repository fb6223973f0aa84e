//! `rtsort` from the RainbowCrack suite: sorts generated rainbow tables in place.

use serde::{Deserialize, Serialize};

use super::ToolPreset;
use crate::session::{CancelPolicy, CommandSpec};

pub const RTSORT_BINARY: &str = "rtsort";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtsortOptions {
    /// Table file or directory of tables
    pub path: String,
}

impl Default for RtsortOptions {
    fn default() -> Self {
        Self {
            path: "./".to_string(),
        }
    }
}

impl ToolPreset for RtsortOptions {
    fn title(&self) -> &'static str {
        "Rainbow Table Sort (rtsort)"
    }

    fn command_spec(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).arg(self.path.as_str())
    }

    /// Sorting rewrites the table in place; a killed run leaves it corrupted.
    fn cancel_policy(&self) -> CancelPolicy {
        CancelPolicy::NonCancellable
    }
}
