use std::path::PathBuf;

use crate::breakpoints::{BreakpointSet, Timestamp};
use crate::config::EngineConfig;
use crate::cursor::PlaybackCursor;
use crate::error::{EngineError, Result};
use crate::history::History;
use crate::media::{PlaybackState, VideoTimeline};
use crate::project::{BreakpointObserver, ProjectState, relative_video_reference};
use crate::store::{FileProjectStore, ProjectStore, with_project_extension};
use tracing::{debug, info, warn};

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Creates a project next to `project_file` and writes it immediately.
    ///
    /// The video path is stored relative to the project directory when the
    /// video lives below it.
    ///
    /// # Example
    /// ```ignore
    /// use std::path::PathBuf;
    /// use engine::{Command, Engine};
    ///
    /// let mut engine = Engine::with_file_store(timeline);
    /// let _ = engine.handle_command(Command::NewProject {
    ///     project_file: PathBuf::from("/talks/intro.eo"),
    ///     video_file: PathBuf::from("/talks/intro.mp4"),
    /// });
    /// ```
    NewProject {
        project_file: PathBuf,
        video_file: PathBuf,
    },
    OpenProject {
        path: PathBuf,
    },
    SaveProject,
    AddBreakpoint {
        at: Timestamp,
    },
    /// Adds several breakpoints as one edit.
    AddBreakpoints {
        at: Vec<Timestamp>,
    },
    /// Adds a breakpoint at the timeline's current position.
    AddBreakpointHere,
    /// Adds `from, from + every, ...` up to and including `to` as one edit.
    AddBreakpointsRegularly {
        from: Timestamp,
        to: Timestamp,
        every: Timestamp,
    },
    RemoveBreakpoint {
        at: Timestamp,
    },
    RemoveBreakpoints {
        at: Vec<Timestamp>,
    },
    ReplaceBreakpoint {
        old: Timestamp,
        new: Timestamp,
    },
    Undo,
    Redo,
    Play,
    Pause,
    TogglePlayPause,
    /// Starts presenting, from the beginning or from the current position.
    StartSlideshow {
        from_here: bool,
    },
    JumpTo {
        at: Timestamp,
    },
    SeekForward,
    SeekBackward,
    /// The user pressed the seek bar.
    BeginScrub,
    /// The user dragged the seek bar.
    ScrubTo {
        at: Timestamp,
    },
    /// The user released the seek bar.
    EndScrub,
    ReloadMedia,
    /// Position notification from the timeline.
    PositionChanged {
        at: Timestamp,
    },
    /// Duration notification from the timeline.
    DurationChanged {
        duration: Timestamp,
    },
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ProjectChanged(ProjectSnapshot),
    PositionChanged { at: Timestamp },
    DurationChanged { duration: Timestamp },
    PlaybackChanged(PlaybackState),
    BreakpointReached { at: Timestamp, position: Timestamp },
    ProjectSaved { path: PathBuf },
    Warning { message: String },
    Error(EngineErrorEvent),
}

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    ProjectNotLoaded,
    InvalidRange,
    Persistence,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::ProjectNotLoaded => Self::ProjectNotLoaded,
            EngineError::InvalidRange { .. } => Self::InvalidRange,
            error if error.is_persistence_failure() => Self::Persistence,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable project view consumed by the UI.
///
/// Carries everything needed to enable or disable actions, so the view layer
/// does not track a separate "project activated" flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub project_file: PathBuf,
    pub video_file: String,
    pub breakpoints: Vec<Timestamp>,
    pub saved: bool,
    pub title: String,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Breakpoint-aware playback controller.
///
/// Owns the active project, its undo history and the playback cursor. Every
/// committed breakpoint edit recomputes the cursor and records a history entry;
/// every discontinuous position change recomputes the cursor only.
pub struct Engine<T, S> {
    timeline: T,
    store: S,
    config: EngineConfig,
    project: ProjectState,
    history: Option<History>,
    cursor: PlaybackCursor,
    seek_step: Timestamp,
}

impl<T> Engine<T, FileProjectStore>
where
    T: VideoTimeline,
{
    /// Creates an engine persisting projects to local files.
    pub fn with_file_store(timeline: T) -> Self {
        Self::new(timeline, FileProjectStore)
    }
}

impl<T, S> Engine<T, S>
where
    T: VideoTimeline,
    S: ProjectStore,
{
    /// Creates a new engine with default calibration.
    pub fn new(timeline: T, store: S) -> Self {
        Self::with_config(timeline, store, EngineConfig::default())
    }

    pub fn with_config(timeline: T, store: S, config: EngineConfig) -> Self {
        Self {
            timeline,
            store,
            cursor: PlaybackCursor::new(config.pause_tolerance_ms),
            config,
            project: ProjectState::default(),
            history: None,
            seek_step: 1,
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::NewProject {
                project_file,
                video_file,
            } => self.new_project(project_file, video_file),
            Command::OpenProject { path } => self.open_project(path),
            Command::SaveProject => self.save_project(),
            Command::AddBreakpoint { at } => {
                self.edit(|project| Ok(project.add_breakpoint(at)))
            }
            Command::AddBreakpoints { at } => {
                self.edit(|project| Ok(project.add_breakpoints(&at)))
            }
            Command::AddBreakpointHere => {
                let at = self.timeline.position();
                self.edit(|project| Ok(project.add_breakpoint(at)))
            }
            Command::AddBreakpointsRegularly { from, to, every } => {
                self.edit(|project| project.add_regularly_spaced(from, to, every))
            }
            Command::RemoveBreakpoint { at } => {
                self.edit(|project| Ok(project.remove_breakpoint(at)))
            }
            Command::RemoveBreakpoints { at } => {
                self.edit(|project| Ok(project.remove_breakpoints(&at)))
            }
            Command::ReplaceBreakpoint { old, new } => {
                self.edit(|project| Ok(project.replace_breakpoint(old, new)))
            }
            Command::Undo => self.step_history(History::go_back),
            Command::Redo => self.step_history(History::advance),
            Command::Play => self.set_playing(true),
            Command::Pause => self.set_playing(false),
            Command::TogglePlayPause => {
                let playing = self.timeline.state().is_playing();
                self.set_playing(!playing)
            }
            Command::StartSlideshow { from_here } => self.start_slideshow(from_here),
            Command::JumpTo { at } => self.jump_to(at),
            Command::SeekForward => {
                let at = self.timeline.position().saturating_add(self.seek_step);
                self.jump_to(at)
            }
            Command::SeekBackward => {
                let at = self.timeline.position().saturating_sub(self.seek_step);
                self.jump_to(at)
            }
            Command::BeginScrub => self.begin_scrub(),
            Command::ScrubTo { at } => self.scrub_to(at),
            Command::EndScrub => self.end_scrub(),
            Command::ReloadMedia => self.reload_media(),
            Command::PositionChanged { at } => Ok(self.position_changed(at)),
            Command::DurationChanged { duration } => Ok(self.duration_changed(duration)),
        }
    }

    /// Registers a callback run after every breakpoint change of the active
    /// project, including undo/redo and project replacement.
    pub fn subscribe_breakpoints(&mut self, observer: BreakpointObserver) {
        self.project.subscribe(observer);
    }

    pub fn is_loaded(&self) -> bool {
        self.history.is_some()
    }

    pub fn project(&self) -> Option<&ProjectState> {
        self.history.as_ref().map(|_| &self.project)
    }

    pub fn breakpoints(&self) -> &BreakpointSet {
        self.project.breakpoints()
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn timeline(&self) -> &T {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut T {
        &mut self.timeline
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seek_step(&self) -> Timestamp {
        self.seek_step
    }

    /// Creates an immutable snapshot for the UI.
    pub fn snapshot(&self) -> Option<ProjectSnapshot> {
        let history = self.history.as_ref()?;
        Some(ProjectSnapshot {
            project_file: self.project.project_file().to_path_buf(),
            video_file: self.project.video_file().to_string(),
            breakpoints: self.project.breakpoints().to_vec(),
            saved: self.project.is_saved(),
            title: self.project.title(),
            can_undo: history.can_go_back(),
            can_redo: history.can_advance(),
        })
    }

    fn new_project(&mut self, project_file: PathBuf, video_file: PathBuf) -> Result<Vec<Event>> {
        let project_file = with_project_extension(project_file);
        let (video_reference, inside_project_dir) =
            relative_video_reference(&project_file, &video_file);

        let mut project = ProjectState::create(project_file, video_reference);
        project.save(&self.store)?;

        let mut events = Vec::new();
        if !inside_project_dir {
            warn!(
                video = %video_file.display(),
                project_dir = %project.project_dir().display(),
                "video is outside the project directory"
            );
            events.push(Event::Warning {
                message: format!(
                    "{} is not below the project directory; it is stored as {}, which breaks \
                     if the project is moved without it",
                    video_file.display(),
                    project.video_file()
                ),
            });
        }
        events.extend(self.activate(project));
        Ok(events)
    }

    fn open_project(&mut self, path: PathBuf) -> Result<Vec<Event>> {
        let project = ProjectState::load(&self.store, &path)?;
        Ok(self.activate(project))
    }

    /// Makes `project` the active project with a fresh history.
    ///
    /// A video that fails to load is reported as an error event; the project
    /// still opens so its breakpoints can be edited.
    fn activate(&mut self, project: ProjectState) -> Vec<Event> {
        self.history = Some(History::new(project.clone()));
        self.project.assign(project);
        self.seek_step = 1;

        let mut events = Vec::new();
        let video = self.project.video_path();
        match self.timeline.load(&video) {
            Ok(()) => self.timeline.seek(0),
            Err(error) => {
                warn!(video = %video.display(), %error, "video failed to load");
                events.push(Event::Error(EngineErrorEvent::from_error(&error)));
            }
        }
        self.recompute_cursor();

        info!(
            path = %self.project.project_file().display(),
            breakpoint_count = self.project.breakpoints().len(),
            "project activated"
        );
        events.extend(self.snapshot().map(Event::ProjectChanged));
        events.push(Event::PositionChanged {
            at: self.timeline.position(),
        });
        events
    }

    fn save_project(&mut self) -> Result<Vec<Event>> {
        let history = self.history.as_mut().ok_or(EngineError::ProjectNotLoaded)?;
        self.project.save(&self.store)?;
        history.set_saved();

        let mut events = vec![Event::ProjectSaved {
            path: self.project.project_file().to_path_buf(),
        }];
        events.extend(self.snapshot().map(Event::ProjectChanged));
        Ok(events)
    }

    fn edit<F>(&mut self, apply: F) -> Result<Vec<Event>>
    where
        F: FnOnce(&mut ProjectState) -> Result<bool>,
    {
        let history = self.history.as_mut().ok_or(EngineError::ProjectNotLoaded)?;
        if !apply(&mut self.project)? {
            return Ok(Vec::new());
        }
        history.push(self.project.clone());
        self.recompute_cursor();

        Ok(self.snapshot().map(Event::ProjectChanged).into_iter().collect())
    }

    fn step_history(&mut self, step: fn(&mut History) -> ProjectState) -> Result<Vec<Event>> {
        let history = self.history.as_mut().ok_or(EngineError::ProjectNotLoaded)?;
        let before = history.current_index();
        let state = step(history);
        if history.current_index() == before {
            debug!(index = before, "history step at boundary");
            return Ok(Vec::new());
        }

        info!(
            from = before,
            to = history.current_index(),
            saved = state.is_saved(),
            "history restored"
        );
        self.project.assign(state);
        self.recompute_cursor();

        Ok(self.snapshot().map(Event::ProjectChanged).into_iter().collect())
    }

    fn set_playing(&mut self, playing: bool) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        if playing {
            self.timeline.play();
        } else {
            self.timeline.pause();
        }
        let state = self.timeline.state();
        self.cursor.on_playback(state);
        Ok(vec![Event::PlaybackChanged(state)])
    }

    fn start_slideshow(&mut self, from_here: bool) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        if !from_here {
            self.timeline.seek(0);
        }
        self.recompute_cursor();
        self.timeline.play();
        let state = self.timeline.state();
        self.cursor.on_playback(state);

        let at = self.timeline.position();
        info!(at, from_here, "slideshow started");
        Ok(vec![Event::PositionChanged { at }, Event::PlaybackChanged(state)])
    }

    fn jump_to(&mut self, at: Timestamp) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        let at = self.clamp_position(at);
        self.timeline.seek(at);
        self.recompute_cursor();
        Ok(vec![Event::PositionChanged {
            at: self.timeline.position(),
        }])
    }

    fn begin_scrub(&mut self) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        self.timeline.pause();
        self.cursor.begin_seek();
        Ok(vec![Event::PlaybackChanged(self.timeline.state())])
    }

    fn scrub_to(&mut self, at: Timestamp) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        let at = self.clamp_position(at);
        self.timeline.seek(at);
        Ok(vec![Event::PositionChanged {
            at: self.timeline.position(),
        }])
    }

    fn end_scrub(&mut self) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        self.recompute_cursor();
        Ok(Vec::new())
    }

    fn reload_media(&mut self) -> Result<Vec<Event>> {
        self.ensure_loaded()?;
        let loaded = self.timeline.load(&self.project.video_path());
        self.recompute_cursor();
        loaded?;
        Ok(vec![Event::PositionChanged {
            at: self.timeline.position(),
        }])
    }

    fn position_changed(&mut self, at: Timestamp) -> Vec<Event> {
        let mut events = vec![Event::PositionChanged { at }];
        if !self.is_loaded() {
            return events;
        }

        let reached =
            self.cursor
                .on_position(self.project.breakpoints(), at, self.timeline.state());
        if let Some(breakpoint) = reached {
            self.timeline.pause();
            info!(breakpoint, position = at, "paused on breakpoint");
            events.push(Event::BreakpointReached {
                at: breakpoint,
                position: at,
            });
            events.push(Event::PlaybackChanged(self.timeline.state()));
        }
        events
    }

    fn duration_changed(&mut self, duration: Timestamp) -> Vec<Event> {
        self.seek_step = self.config.seek_step_for(duration);
        debug!(duration, seek_step = self.seek_step, "duration changed");
        vec![Event::DurationChanged { duration }]
    }

    fn recompute_cursor(&mut self) {
        self.cursor.recompute(
            self.project.breakpoints(),
            self.timeline.position(),
            self.timeline.state(),
        );
    }

    fn clamp_position(&self, at: Timestamp) -> Timestamp {
        let duration = self.timeline.duration();
        if duration <= 0 {
            return at.max(0);
        }
        at.clamp(0, duration)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(EngineError::ProjectNotLoaded)
        }
    }
}
