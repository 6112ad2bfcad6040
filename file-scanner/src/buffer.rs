//! Shared scan results and the readiness handshake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered scan results plus a flag saying a pass has finished.
///
/// The producer calls [`begin_pass`](Self::begin_pass), pushes entries, then
/// [`finish_pass`](Self::finish_pass). A consumer on another thread polls
/// [`is_ready`](Self::is_ready) and only then reads. Reading does not clear;
/// [`clear`](Self::clear) does, and also drops readiness.
#[derive(Debug, Default)]
pub struct ResultBuffer {
    entries: Mutex<Vec<String>>,
    ready: AtomicBool,
}

impl ResultBuffer {
    /// Create an empty, not-ready buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pass as in flight.
    pub fn begin_pass(&self) {
        self.ready.store(false, Ordering::Release);
    }

    /// Mark the current pass as complete.
    pub fn finish_pass(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether the last pass has finished and nothing cleared it since.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Append one entry.
    pub fn push(&self, entry: String) {
        self.lock().push(entry);
    }

    /// All entries joined into one blob, each terminated by a newline.
    pub fn consume(&self) -> String {
        let entries = self.lock();
        let mut blob = String::with_capacity(entries.iter().map(|e| e.len() + 1).sum());
        for entry in entries.iter() {
            blob.push_str(entry);
            blob.push('\n');
        }
        blob
    }

    /// Snapshot of the entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Drop all entries and readiness.
    pub fn clear(&self) {
        self.lock().clear();
        self.ready.store(false, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
