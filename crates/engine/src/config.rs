use serde::{Deserialize, Serialize};

use crate::breakpoints::Timestamp;

/// Distance under which a reported position counts as "on" a breakpoint.
pub const DEFAULT_PAUSE_TOLERANCE_MS: i64 = 10;
pub const DEFAULT_MAX_SEEK_STEP_MS: i64 = 1_000;
pub const DEFAULT_SEEK_STEP_DIVISOR: i64 = 10;

/// Calibration knobs for the playback engine.
///
/// The tolerance must stay above the host's position notification interval,
/// otherwise a breakpoint can be stepped over between two notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    pub pause_tolerance_ms: i64,
    pub max_seek_step_ms: i64,
    pub seek_step_divisor: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pause_tolerance_ms: DEFAULT_PAUSE_TOLERANCE_MS,
            max_seek_step_ms: DEFAULT_MAX_SEEK_STEP_MS,
            seek_step_divisor: DEFAULT_SEEK_STEP_DIVISOR,
        }
    }
}

impl EngineConfig {
    /// Seek forward/backward step for a video of `duration` milliseconds.
    ///
    /// Short videos step by a fixed fraction of their duration, long videos
    /// by `max_seek_step_ms`.
    pub fn seek_step_for(&self, duration: Timestamp) -> Timestamp {
        let divisor = self.seek_step_divisor.max(1);
        if duration > self.max_seek_step_ms.saturating_mul(divisor) {
            return self.max_seek_step_ms;
        }
        (duration / divisor).max(1)
    }
}
