use std::path::Path;

use crate::breakpoints::Timestamp;
use crate::error::Result;

/// Transport state reported by the video timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Video playback operations required by the engine.
///
/// Decoding and rendering live behind this trait. Position and duration
/// notifications are not pulled through it: the host forwards them as
/// [`crate::Command::PositionChanged`] and [`crate::Command::DurationChanged`].
pub trait VideoTimeline {
    /// Loads (or reloads) the video file and rewinds to the start.
    fn load(&mut self, video: &Path) -> Result<()>;

    /// Current position in milliseconds.
    fn position(&self) -> Timestamp;

    /// Media duration in milliseconds, `0` while unknown.
    fn duration(&self) -> Timestamp;

    fn state(&self) -> PlaybackState;

    fn seek(&mut self, at: Timestamp);

    fn play(&mut self);

    fn pause(&mut self);
}
