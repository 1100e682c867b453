//! UI-agnostic rehearsal engine for Slideo presentation projects.

pub mod api;
pub mod breakpoints;
pub mod bridge;
pub mod config;
pub mod cursor;
pub mod error;
pub mod history;
pub mod media;
pub mod project;
pub mod store;
pub mod time;

pub use api::{Command, Engine, EngineErrorEvent, EngineErrorKind, Event, ProjectSnapshot};
pub use breakpoints::{BreakpointSet, MAX_REGULARLY_SPACED, Timestamp, regularly_spaced};
pub use bridge::{
    BridgeError, EngineBridge, EngineCommandSender, EngineEventReceiver, spawn_engine_bridge,
};
pub use config::EngineConfig;
pub use cursor::{CursorState, PlaybackCursor};
pub use error::{EngineError, Result};
pub use history::History;
pub use media::{PlaybackState, VideoTimeline};
pub use project::{BreakpointObserver, ProjectDocument, ProjectState};
pub use store::{FileProjectStore, ProjectStore};
pub use time::{format_timestamp, parse_timestamp};
