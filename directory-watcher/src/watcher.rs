//! Change monitor: wait for a notification batch, decode it, filter it, log it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::decoder::{decode, decode_buffer, is_recycle_bin};
use crate::error::{Result, WatcherError};
use crate::event::{ADDED_LOG_NAME, ChangeAction, ChangeEvent, Decoded, REMOVED_LOG_NAME};
use crate::source::{Batch, NotificationSource, NotifySource};

/// Where the monitor is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Watching,
    Decoding,
    Filtering,
    Logging,
    Stopped,
}

/// Counters for one monitor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Batches received from the source.
    pub batches: usize,

    /// Lines appended to the two logs.
    pub lines_written: usize,

    /// Events dropped by the filters.
    pub filtered: usize,

    /// Records with an unrecognized action code.
    pub unknown: usize,

    /// Raw buffers that failed to decode.
    pub malformed: usize,
}

/// Monitors one tree and appends its changes to the Added-log and Removed-log.
pub struct ChangeMonitor {
    config: MonitorConfig,
    state: MonitorState,
}

impl ChangeMonitor {
    /// Create a new monitor.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: MonitorState::Idle,
        }
    }

    /// Current loop state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The monitor's configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Watch the configured root recursively until the stop condition holds.
    ///
    /// Fails without entering the loop when the watch cannot be acquired.
    pub fn run(&mut self) -> Result<MonitorSummary> {
        info!("Start monitor: {}", self.config.root);
        fs::create_dir_all(&self.config.output_dir)?;

        let source = match NotifySource::watch(self.config.root_path()) {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to watch {}: {e}", self.config.root);
                return Err(e);
            }
        };
        self.run_with(source)
    }

    /// Run the loop over an already acquired source.
    ///
    /// The source is dropped, releasing any OS watch, before this returns.
    pub fn run_with<S: NotificationSource>(&mut self, mut source: S) -> Result<MonitorSummary> {
        let mut summary = MonitorSummary::default();
        self.state = MonitorState::Watching;

        let outcome = loop {
            if self.config.stop.should_stop() {
                break Ok(());
            }

            let batch = match source.next_batch(self.config.poll_interval) {
                Ok(Some(batch)) => batch,
                Ok(None) => continue,
                Err(WatcherError::SourceClosed) => {
                    info!("Notification source closed: {}", self.config.root);
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            summary.batches += 1;
            self.handle_batch(batch, &mut summary);
            self.state = MonitorState::Watching;
        };

        drop(source);
        self.state = MonitorState::Stopped;
        info!(
            "Exit monitor: {} ({} lines written)",
            self.config.root, summary.lines_written
        );
        outcome.map(|()| summary)
    }

    fn handle_batch(&mut self, batch: Batch, summary: &mut MonitorSummary) {
        self.state = MonitorState::Decoding;
        let decoded = match batch {
            Batch::Raw(buf) => match decode_buffer(&buf) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("Dropping malformed notification buffer: {e}");
                    summary.malformed += 1;
                    return;
                }
            },
            Batch::Records(records) => decode(&records),
        };

        self.state = MonitorState::Filtering;
        let mut events = Vec::with_capacity(decoded.len());
        for item in decoded {
            match item {
                Decoded::Change(event) if is_loggable(&event) => events.push(event),
                Decoded::Change(event) => {
                    debug!("Filtered {:?} {}", event.action, event.name);
                    summary.filtered += 1;
                }
                Decoded::Unknown { code, name } => {
                    warn!("Unknown action {code} for {name}");
                    summary.unknown += 1;
                }
            }
        }

        self.state = MonitorState::Logging;
        for event in events {
            let line = event.log_line(&self.config.root);
            info!("{} : {line}", event.action.label());
            let path = self.config.log_path(event.action.log());
            match append_line(&path, &line) {
                Ok(()) => summary.lines_written += 1,
                Err(e) => warn!("Failed to append to {}: {e}", path.display()),
            }
        }
    }
}

/// Whether an event survives filtering.
///
/// Modifications to the monitor's own logs are dropped, or every log write
/// would produce another event.
fn is_loggable(event: &ChangeEvent) -> bool {
    if is_recycle_bin(&event.name) {
        return false;
    }
    !(event.action == ChangeAction::Modified
        && (event.name.contains(ADDED_LOG_NAME) || event.name.contains(REMOVED_LOG_NAME)))
}

/// Append one line, holding the file open only for this write.
fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
