use std::path::Path;

use engine::{EngineError, PlaybackState, Result, Timestamp, VideoTimeline};

/// Timeline without a decoder, driven by positions supplied on the command line.
#[derive(Debug, Default)]
pub struct ScriptedTimeline {
    position: Timestamp,
    duration: Timestamp,
    state: PlaybackState,
}

impl ScriptedTimeline {
    /// Moves the playhead as a decoder would while playing.
    pub fn advance_to(&mut self, at: Timestamp) {
        self.position = at;
        self.duration = self.duration.max(at);
    }
}

impl VideoTimeline for ScriptedTimeline {
    fn load(&mut self, video: &Path) -> Result<()> {
        self.position = 0;
        self.duration = 0;
        self.state = PlaybackState::Stopped;
        if !video.is_file() {
            return Err(EngineError::Media {
                path: video.to_path_buf(),
                reason: "video file not found".to_string(),
            });
        }
        Ok(())
    }

    fn position(&self) -> Timestamp {
        self.position
    }

    fn duration(&self) -> Timestamp {
        self.duration
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn seek(&mut self, at: Timestamp) {
        self.position = at;
    }

    fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }
}
