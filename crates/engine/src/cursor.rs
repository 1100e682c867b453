use tracing::debug;

use crate::breakpoints::{BreakpointSet, Timestamp};
use crate::media::PlaybackState;

/// Lifecycle of the breakpoint cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorState {
    #[default]
    Idle,
    Seeking,
    Playing,
    PausedAtBreakpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextBreakpoint {
    /// No recompute has happened yet.
    Unarmed,
    At(Timestamp),
    End,
}

/// Tracks the next breakpoint ahead of the playhead.
///
/// The cursor is rebuilt from scratch on every discontinuous position change
/// and stepped forward by exactly one breakpoint each time a pause fires, so a
/// breakpoint pauses playback at most once per forward pass.
///
/// # Example
/// ```
/// use engine::{BreakpointSet, PlaybackCursor, PlaybackState};
///
/// let breakpoints = BreakpointSet::from_iter([2_000, 5_000]);
/// let mut cursor = PlaybackCursor::new(10);
/// cursor.recompute(&breakpoints, 0, PlaybackState::Playing);
///
/// assert_eq!(cursor.on_position(&breakpoints, 1_500, PlaybackState::Playing), None);
/// assert_eq!(cursor.on_position(&breakpoints, 2_003, PlaybackState::Playing), Some(2_000));
/// assert_eq!(cursor.next_breakpoint(), Some(5_000));
/// ```
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    tolerance_ms: i64,
    next: NextBreakpoint,
    state: CursorState,
}

impl PlaybackCursor {
    pub fn new(tolerance_ms: i64) -> Self {
        Self {
            tolerance_ms,
            next: NextBreakpoint::Unarmed,
            state: CursorState::Idle,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn tolerance_ms(&self) -> i64 {
        self.tolerance_ms
    }

    /// Breakpoint the cursor is waiting for, `None` when unarmed or at end.
    pub fn next_breakpoint(&self) -> Option<Timestamp> {
        match self.next {
            NextBreakpoint::At(at) => Some(at),
            NextBreakpoint::Unarmed | NextBreakpoint::End => None,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.next == NextBreakpoint::End
    }

    /// Marks the start of a user drag on the seek bar.
    ///
    /// Position reports are ignored until the next [`Self::recompute`].
    pub fn begin_seek(&mut self) {
        self.state = CursorState::Seeking;
    }

    /// Re-establishes "next breakpoint strictly after `position`".
    pub fn recompute(
        &mut self,
        breakpoints: &BreakpointSet,
        position: Timestamp,
        playback: PlaybackState,
    ) {
        self.next = next_after(breakpoints, position);
        self.state = if playback.is_playing() {
            CursorState::Playing
        } else {
            CursorState::Idle
        };
        debug!(
            position,
            next = ?self.next_breakpoint(),
            state = ?self.state,
            "cursor recomputed"
        );
    }

    /// Follows a play/pause transition reported by the timeline.
    pub fn on_playback(&mut self, playback: PlaybackState) {
        match (self.state, playback.is_playing()) {
            (CursorState::Seeking, _) => {}
            (_, true) => self.state = CursorState::Playing,
            (CursorState::Playing, false) => self.state = CursorState::Idle,
            (_, false) => {}
        }
    }

    /// Handles a position notification.
    ///
    /// Returns the breakpoint to pause on when `position` lies within the
    /// tolerance of the next breakpoint. The caller must pause the timeline.
    pub fn on_position(
        &mut self,
        breakpoints: &BreakpointSet,
        position: Timestamp,
        playback: PlaybackState,
    ) -> Option<Timestamp> {
        if !playback.is_playing() || position == 0 || self.state == CursorState::Seeking {
            return None;
        }
        self.state = CursorState::Playing;

        let NextBreakpoint::At(target) = self.next else {
            return None;
        };
        if position.abs_diff(target) >= self.tolerance_ms.unsigned_abs() {
            return None;
        }

        self.next = next_after(breakpoints, target);
        self.state = CursorState::PausedAtBreakpoint;
        debug!(
            position,
            breakpoint = target,
            next = ?self.next_breakpoint(),
            "breakpoint reached"
        );
        Some(target)
    }
}

fn next_after(breakpoints: &BreakpointSet, position: Timestamp) -> NextBreakpoint {
    match breakpoints.first_after(position) {
        Some(at) => NextBreakpoint::At(at),
        None => NextBreakpoint::End,
    }
}
