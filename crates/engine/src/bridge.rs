use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread;

use tracing::debug;

use crate::api::{Command, Engine, EngineErrorEvent, Event};
use crate::media::VideoTimeline;
use crate::store::ProjectStore;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Sender used by the front end and the timeline to reach the engine thread.
///
/// Timeline notifications travel as [`Command::PositionChanged`] and
/// [`Command::DurationChanged`] through the same channel as user commands, so
/// the engine observes them in one serial order.
pub type EngineCommandSender = SyncSender<Command>;

/// Receiver for events emitted by the engine thread.
///
/// The event channel is unbounded: the worker never blocks on a host that is
/// itself blocked sending commands, so one thread may both send and drain.
pub type EngineEventReceiver = Receiver<Event>;

/// Spawns a worker thread that owns `engine` and serves commands until every
/// sender is dropped.
///
/// Failed commands are reported as [`Event::Error`].
pub fn spawn_engine_bridge<T, S>(
    mut engine: Engine<T, S>,
) -> (EngineCommandSender, EngineEventReceiver)
where
    T: VideoTimeline + Send + 'static,
    S: ProjectStore + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            let events = match engine.handle_command(command) {
                Ok(events) => events,
                Err(error) => vec![Event::Error(EngineErrorEvent::from_error(&error))],
            };
            for event in events {
                if event_tx.send(event).is_err() {
                    return;
                }
            }
        }
        debug!("engine bridge stopped");
    });

    (command_tx, event_rx)
}

/// Channel-backed handle to an engine worker.
#[derive(Debug)]
pub struct EngineBridge {
    command_tx: EngineCommandSender,
    event_rx: EngineEventReceiver,
}

impl EngineBridge {
    /// Spawns a worker for `engine` and wraps its channels.
    pub fn spawn<T, S>(engine: Engine<T, S>) -> Self
    where
        T: VideoTimeline + Send + 'static,
        S: ProjectStore + Send + 'static,
    {
        let (command_tx, event_rx) = spawn_engine_bridge(engine);
        Self {
            command_tx,
            event_rx,
        }
    }

    /// Returns a sender that a timeline can use to report playback progress.
    pub fn command_sender(&self) -> EngineCommandSender {
        self.command_tx.clone()
    }

    pub fn send_command(&self, command: Command) -> Result<(), BridgeError> {
        self.command_tx
            .send(command)
            .map_err(|_| BridgeError::Disconnected)
    }

    /// Blocks until the next event arrives.
    pub fn recv_event(&self) -> Result<Event, BridgeError> {
        self.event_rx.recv().map_err(|_| BridgeError::Disconnected)
    }

    /// Receives all currently queued events without blocking.
    pub fn drain_events(&self) -> Result<Vec<Event>, BridgeError> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return Ok(events),
                Err(TryRecvError::Disconnected) => return Err(BridgeError::Disconnected),
            }
        }
    }
}

/// Error raised by the engine bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    Disconnected,
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{COMMAND_CHANNEL_CAPACITY, EngineBridge, spawn_engine_bridge};
    use crate::api::{Command, Engine, EngineErrorKind, Event};
    use crate::breakpoints::Timestamp;
    use crate::error::Result;
    use crate::media::{PlaybackState, VideoTimeline};
    use crate::project::ProjectDocument;
    use crate::store::ProjectStore;

    #[test]
    fn bridge_forwards_engine_events_for_open_command() {
        let (command_tx, event_rx) =
            spawn_engine_bridge(Engine::new(StillTimeline, SharedStore::new()));

        command_tx
            .send(Command::OpenProject {
                path: PathBuf::from("/talks/intro.eo"),
            })
            .expect("send open command");

        let first = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("first event");
        let second = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("second event");

        assert!(matches!(first, Event::ProjectChanged(_)));
        assert_eq!(second, Event::PositionChanged { at: 0 });
    }

    #[test]
    fn bridge_emits_error_event_when_command_fails() {
        let (command_tx, event_rx) =
            spawn_engine_bridge(Engine::new(StillTimeline, SharedStore::new()));

        command_tx
            .send(Command::AddBreakpoint { at: 10 })
            .expect("send add command");

        let event = event_rx
            .recv_timeout(Duration::from_secs(1))
            .expect("error event");
        let Event::Error(error) = event else {
            panic!("expected error event, got {event:?}");
        };
        assert_eq!(error.kind, EngineErrorKind::ProjectNotLoaded);
    }

    #[test]
    fn timeline_notifications_share_the_command_order() {
        let bridge = EngineBridge::spawn(Engine::new(StillTimeline, SharedStore::new()));
        let notifier = bridge.command_sender();

        bridge
            .send_command(Command::OpenProject {
                path: PathBuf::from("/talks/intro.eo"),
            })
            .expect("send open command");
        notifier
            .send(Command::DurationChanged { duration: 60_000 })
            .expect("send duration");

        let mut events = Vec::new();
        while events.len() < 3 {
            events.push(bridge.recv_event().expect("event"));
        }
        assert_eq!(events[2], Event::DurationChanged { duration: 60_000 });
        assert_eq!(
            bridge.drain_events().expect("drain events"),
            Vec::<Event>::new()
        );
    }

    #[test]
    fn one_thread_can_send_many_commands_before_draining() {
        let bridge = EngineBridge::spawn(Engine::new(StillTimeline, SharedStore::new()));
        let positions = COMMAND_CHANNEL_CAPACITY * 8;

        bridge
            .send_command(Command::OpenProject {
                path: PathBuf::from("/talks/intro.eo"),
            })
            .expect("send open command");
        for at in 1..=positions {
            bridge
                .send_command(Command::PositionChanged { at: at as Timestamp })
                .expect("send position");
        }

        let mut events = Vec::new();
        while events.len() < positions + 2 {
            events.push(
                bridge
                    .event_rx
                    .recv_timeout(Duration::from_secs(1))
                    .expect("queued event"),
            );
        }
        assert_eq!(
            events.last(),
            Some(&Event::PositionChanged {
                at: positions as Timestamp
            })
        );
    }

    #[derive(Debug)]
    struct StillTimeline;

    impl VideoTimeline for StillTimeline {
        fn load(&mut self, _video: &Path) -> Result<()> {
            Ok(())
        }

        fn position(&self) -> Timestamp {
            0
        }

        fn duration(&self) -> Timestamp {
            0
        }

        fn state(&self) -> PlaybackState {
            PlaybackState::Stopped
        }

        fn seek(&mut self, _at: Timestamp) {}

        fn play(&mut self) {}

        fn pause(&mut self) {}
    }

    #[derive(Debug, Clone)]
    struct SharedStore {
        document: Arc<Mutex<ProjectDocument>>,
    }

    impl SharedStore {
        fn new() -> Self {
            Self {
                document: Arc::new(Mutex::new(ProjectDocument {
                    video_file: "intro.mp4".to_string(),
                    breakpoints: [2_000].into_iter().collect(),
                })),
            }
        }
    }

    impl ProjectStore for SharedStore {
        fn load(&self, _path: &Path) -> Result<ProjectDocument> {
            Ok(self.document.lock().expect("lock document").clone())
        }

        fn save(&self, _path: &Path, document: &ProjectDocument) -> Result<()> {
            *self.document.lock().expect("lock document") = document.clone();
            Ok(())
        }
    }
}
