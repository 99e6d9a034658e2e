use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest recording accepted, in seconds
pub const MIN_DURATION_SECS: u32 = 10;

/// Longest recording accepted, in seconds. The next tick auto-stops.
pub const MAX_DURATION_SECS: u32 = 20;

/// One timer tick advances the recording by one second
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Duration window for a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            min_duration_secs: MIN_DURATION_SECS,
            max_duration_secs: MAX_DURATION_SECS,
        }
    }
}

impl SessionLimits {
    /// Whether a finished recording of this length is usable
    pub fn accepts(&self, duration_secs: u32) -> bool {
        (self.min_duration_secs..=self.max_duration_secs).contains(&duration_secs)
    }
}
