//! One-shot gates a transfer's thread parks on between phases.

use std::sync::{Condvar, Mutex};

/// A latch: starts closed, opens once, never closes again.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub(crate) fn open(&self) {
        let mut open = self.open.lock().expect("gate mutex poisoned");
        debug_assert!(!*open, "gate opened twice");
        *open = true;
        self.cv.notify_all();
    }

    /// Block until [`Gate::open`] was called. Returns at once if it already was.
    pub(crate) fn wait(&self) {
        let mut open = self.open.lock().expect("gate mutex poisoned");
        while !*open {
            open = self.cv.wait(open).expect("gate condvar poisoned");
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        *self.open.lock().expect("gate mutex poisoned")
    }
}

/// The gates of one in-flight transfer. Allocated fresh on admission.
#[derive(Debug, Default)]
pub(crate) struct GatePair {
    pub(crate) prepare: Gate,
    pub(crate) perform: Gate,
}
