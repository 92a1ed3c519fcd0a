pub mod simulated;

use serde::{Deserialize, Serialize};

pub use crate::error::SensorError;
pub use simulated::{spawn_simulated_source, SimulatedCourse, SimulatedSource, SourceOutput};

/// Options a location watch is opened with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// A fix not delivered within this window is reported as `Timeout`
    pub timeout_ms: u64,
    /// Cached positions younger than this may be delivered again; 0 disables caching
    pub max_fix_age_ms: u64,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 1_500,
            max_fix_age_ms: 0,
        }
    }
}
