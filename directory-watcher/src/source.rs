//! Notification sources feeding the change monitor.
//!
//! A source blocks until the OS (or a replay) delivers one batch of change
//! records. [`NotifySource`] watches a tree with the platform's recommended
//! backend; [`ReplaySource`] hands out prepared batches, raw or typed.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::{Result, WatcherError};
use crate::event::{RawAction, RawRecord};

/// One delivery from a notification source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    /// A raw notification buffer, still to be parsed.
    Raw(Vec<u8>),

    /// Records already split out by the watch backend.
    Records(Vec<RawRecord>),
}

/// Something that delivers change batches for one watched tree.
pub trait NotificationSource {
    /// Block until the next batch arrives.
    ///
    /// With a timeout, returns `Ok(None)` when it elapses without a delivery.
    /// Returns [`WatcherError::SourceClosed`] once no more batches can arrive.
    fn next_batch(&mut self, timeout: Option<Duration>) -> Result<Option<Batch>>;
}

/// Recursive watch backed by the platform's recommended `notify` watcher.
///
/// Dropping the source releases the OS watch handle.
pub struct NotifySource {
    /// Keep alive: dropping the watcher stops watching.
    _watcher: RecommendedWatcher,

    /// Raw events from the watcher callback.
    rx: Receiver<notify::Result<notify::Event>>,

    /// Root as given, plus its canonical form when that differs.
    roots: Vec<PathBuf>,
}

impl NotifySource {
    /// Start a recursive watch on `root`.
    pub fn watch(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            forward(&tx, res);
        })
        .map_err(|e| WatcherError::watch_setup(root, e))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::watch_setup(root, e))?;

        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize()
            && canonical.as_path() != root
        {
            roots.push(canonical);
        }

        debug!("Started watching: {}", root.display());
        Ok(Self {
            _watcher: watcher,
            rx,
            roots,
        })
    }

    fn collect(&self, res: notify::Result<notify::Event>, records: &mut Vec<RawRecord>) {
        match res {
            Ok(event) => records.extend(records_from_event(&event, &self.roots)),
            Err(e) => warn!("Watch error: {e}"),
        }
    }
}

impl NotificationSource for NotifySource {
    fn next_batch(&mut self, timeout: Option<Duration>) -> Result<Option<Batch>> {
        let first = match timeout {
            None => self.rx.recv().map_err(|_| WatcherError::SourceClosed)?,
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(res) => res,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(WatcherError::SourceClosed),
            },
        };

        // Everything already queued belongs to the same delivery, so a rename's
        // two halves reported back to back stay in one batch.
        let mut records = Vec::new();
        self.collect(first, &mut records);
        while let Ok(res) = self.rx.try_recv() {
            self.collect(res, &mut records);
        }

        Ok(Some(Batch::Records(records)))
    }
}

/// Hand one watcher callback result to the monitor side.
///
/// Returns false once the receiving source has been dropped.
fn forward(tx: &Sender<notify::Result<notify::Event>>, res: notify::Result<notify::Event>) -> bool {
    match tx.send(res) {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send file event: {e}");
            false
        }
    }
}

/// Map one `notify` event onto raw records named relative to the root.
fn records_from_event(event: &notify::Event, roots: &[PathBuf]) -> Vec<RawRecord> {
    let action = match event.kind {
        EventKind::Create(_) => Some(RawAction::Added),
        EventKind::Remove(_) => Some(RawAction::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(RawAction::RenamedOldName),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(RawAction::RenamedNewName),
        // Backends that emit `Both` also emit the `From` and `To` halves.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
        // Direction unknown: decided per path below.
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => return Vec::new(),
        EventKind::Modify(_) => Some(RawAction::Modified),
        EventKind::Any | EventKind::Other => Some(RawAction::Unknown(0)),
    };

    event
        .paths
        .iter()
        .filter_map(|path| {
            let name = relative_name(path, roots)?;
            let action = action.unwrap_or_else(|| {
                if path.exists() {
                    RawAction::Added
                } else {
                    RawAction::Removed
                }
            });
            Some(RawRecord::new(action, name))
        })
        .collect()
}

fn relative_name(path: &Path, roots: &[PathBuf]) -> Option<String> {
    let rel = roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
    let name = rel.to_string_lossy();
    if name.is_empty() {
        None
    } else {
        Some(name.into_owned())
    }
}

/// Replays prepared batches, then reports the source as closed.
pub struct ReplaySource<I> {
    batches: I,
}

impl<I: Iterator<Item = Batch>> ReplaySource<I> {
    /// Create a replay over `batches`.
    pub fn new(batches: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            batches: batches.into_iter(),
        }
    }
}

impl ReplaySource<std::vec::IntoIter<Batch>> {
    /// Replay raw notification buffers, one batch each.
    pub fn from_buffers(buffers: Vec<Vec<u8>>) -> Self {
        Self::new(buffers.into_iter().map(Batch::Raw).collect::<Vec<_>>())
    }
}

impl<I: Iterator<Item = Batch>> NotificationSource for ReplaySource<I> {
    fn next_batch(&mut self, _timeout: Option<Duration>) -> Result<Option<Batch>> {
        self.batches.next().map(Some).ok_or(WatcherError::SourceClosed)
    }
}
