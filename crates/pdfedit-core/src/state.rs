//! Saved-state tracking for the open document
//!
//! Holds the path the document was last opened from or saved to and whether
//! it has changed since. Observers are called synchronously after every
//! setter, which is what keeps a title bar or "unsaved" marker current.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&DocumentState)>;

#[derive(Default)]
pub struct DocumentState {
    source_path: Option<PathBuf>,
    modified: bool,
    next_observer: u64,
    observers: Vec<(ObserverId, Observer)>,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_source_path(&mut self, path: Option<PathBuf>) {
        self.source_path = path;
        self.notify();
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
        self.notify();
    }

    /// Register a callback fired after each state change
    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentState) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        // Observers see the state through a shared borrow, so take them out first
        let mut observers = std::mem::take(&mut self.observers);
        for (_, observer) in observers.iter_mut() {
            observer(self);
        }
        self.observers = observers;
    }
}

impl fmt::Debug for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentState")
            .field("source_path", &self.source_path)
            .field("modified", &self.modified)
            .field("observers", &self.observers.len())
            .finish()
    }
}
