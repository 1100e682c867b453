//! Linear undo/redo history of project states.
//!
//! Entries are independent copies. Whether an entry is "saved" is not stored
//! per entry: it is derived from its position relative to the single index
//! that matches the file on disk. Pushing after an undo discards the redo
//! branch for good.

use tracing::debug;

use crate::project::ProjectState;

#[derive(Debug, Clone)]
pub struct History {
    states: Vec<ProjectState>,
    current: usize,
    saved: Option<usize>,
}

impl History {
    /// Starts a history containing only `first`.
    pub fn new(first: ProjectState) -> Self {
        let saved = first.is_saved().then_some(0);
        Self {
            states: vec![first],
            current: 0,
            saved,
        }
    }

    /// Returns a copy of the current entry with its saved flag derived.
    pub fn current(&self) -> ProjectState {
        let mut state = self.states[self.current].clone();
        state.set_saved_flag(self.saved == Some(self.current));
        state
    }

    /// Steps back one entry; saturates at the oldest entry.
    pub fn go_back(&mut self) -> ProjectState {
        if self.current > 0 {
            self.current -= 1;
            debug!(current = self.current, len = self.states.len(), "history went back");
        }
        self.current()
    }

    /// Steps forward one entry; saturates at the newest entry.
    pub fn advance(&mut self) -> ProjectState {
        if self.current + 1 < self.states.len() {
            self.current += 1;
            debug!(current = self.current, len = self.states.len(), "history advanced");
        }
        self.current()
    }

    /// Records `state` after the current entry, dropping any redo entries.
    pub fn push(&mut self, state: ProjectState) {
        let keep = self.current + 1;
        if keep < self.states.len() {
            let discarded = self.states.len() - keep;
            self.states.truncate(keep);
            if self.saved.is_some_and(|saved| saved >= keep) {
                self.saved = None;
            }
            debug!(discarded, "redo branch discarded");
        }

        self.states.push(state);
        self.current = self.states.len() - 1;
        debug!(current = self.current, saved = ?self.saved, "history entry pushed");
    }

    /// Marks the current entry as the one matching the file on disk.
    pub fn set_saved(&mut self) {
        self.saved = Some(self.current);
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn can_advance(&self) -> bool {
        self.current + 1 < self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn saved_index(&self) -> Option<usize> {
        self.saved
    }
}
