//! Configuration types for change monitoring.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::event::ChangeLog;

/// Configuration for one monitored tree.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Root of the watched tree, exactly as given by the caller.
    ///
    /// Log lines are this string concatenated with the changed entry's
    /// relative name, so callers that want a separator pass a trailing one.
    pub root: String,

    /// Directory that receives the Added-log and Removed-log.
    pub output_dir: PathBuf,

    /// When to stop the monitor loop.
    pub stop: StopCondition,

    /// Upper bound on one wait for notifications (None = wait indefinitely).
    ///
    /// The stop condition is only re-checked between waits, so with no bound
    /// a quiescent tree delays shutdown until the next change.
    pub poll_interval: Option<Duration>,
}

impl MonitorConfig {
    /// Create a new monitor config.
    pub fn new(root: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_dir: output_dir.into(),
            stop: StopCondition::default(),
            poll_interval: None,
        }
    }

    /// Stop once `path` exists.
    pub fn with_sentinel(mut self, path: impl Into<PathBuf>) -> Self {
        self.stop.sentinel = Some(path.into());
        self
    }

    /// Stop once `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.stop.token = token;
        self
    }

    /// Bound each wait so the stop condition is re-checked at least this often.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Path of one of the two change logs.
    pub fn log_path(&self, log: ChangeLog) -> PathBuf {
        self.output_dir.join(log.file_name())
    }

    /// Root as a filesystem path.
    pub fn root_path(&self) -> &Path {
        Path::new(&self.root)
    }
}

/// Stop signal checked before each blocking wait.
#[derive(Debug, Clone, Default)]
pub struct StopCondition {
    /// Sentinel stop-file; its existence ends the loop.
    pub sentinel: Option<PathBuf>,

    /// Cancellation token; cancelling it ends the loop.
    pub token: CancellationToken,
}

impl StopCondition {
    /// Whether the monitor should stop now.
    pub fn should_stop(&self) -> bool {
        self.token.is_cancelled() || self.sentinel.as_ref().is_some_and(|p| p.exists())
    }
}
