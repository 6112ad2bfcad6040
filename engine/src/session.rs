//! The host-facing engine session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use file_engine_directory_watcher::{ChangeMonitor, MonitorConfig, MonitorSummary};
use file_engine_scanner::{DepthMode, IgnoreRegistry, ResultBuffer, ScanSummary, TreeScanner};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{DEFAULT_SEARCH_DEPTH, EngineConfig};
use crate::error::Result;
use crate::platform::{VolumeProbe, select_index_roots};

/// One engine session: an ignore registry, a depth limit and a result buffer.
///
/// Sessions are independent; nothing is process-wide. Scans run on the
/// calling thread, or on the blocking pool through the `spawn_*` helpers so
/// the caller can poll [`is_result_ready`](Self::is_result_ready) meanwhile.
pub struct FileEngine {
    ignore: IgnoreRegistry,
    depth_limit: usize,
    results: Arc<ResultBuffer>,
    poll_interval: Option<Duration>,
}

impl FileEngine {
    /// Create a session with an empty ignore registry.
    pub fn new() -> Self {
        Self {
            ignore: IgnoreRegistry::new(),
            depth_limit: DEFAULT_SEARCH_DEPTH,
            results: Arc::new(ResultBuffer::new()),
            poll_interval: None,
        }
    }

    /// Create a session from settings.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engine = Self::new();
        engine.ignore.extend_from_list(&config.ignore_path);
        engine.depth_limit = config.search_depth;
        engine.poll_interval = config.poll_interval();
        engine
    }

    pub fn set_depth_limit(&mut self, depth: usize) {
        self.depth_limit = depth;
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Exclude subtrees below paths containing `path` (case-insensitive).
    pub fn add_ignore_path(&mut self, path: &str) {
        self.ignore.add(path);
    }

    pub fn ignore_registry(&self) -> &IgnoreRegistry {
        &self.ignore
    }

    /// Shared handle to the result buffer, for polling from another thread.
    pub fn results(&self) -> Arc<ResultBuffer> {
        Arc::clone(&self.results)
    }

    pub fn clear_results(&self) {
        self.results.clear();
    }

    pub fn is_result_ready(&self) -> bool {
        self.results.is_ready()
    }

    /// The accumulated results, one path per line. Does not clear them.
    pub fn pull_result_text(&self) -> String {
        self.results.consume()
    }

    /// Depth-bounded scan of `root`, blocking until it completes.
    pub fn scan(&self, root: &str, extension: &str) -> Result<ScanSummary> {
        self.run_scan(root, extension, DepthMode::Bounded(self.depth_limit))
    }

    /// Scan of `root` ignoring the depth limit, blocking until it completes.
    pub fn scan_unbounded(&self, root: &str, extension: &str) -> Result<ScanSummary> {
        self.run_scan(root, extension, DepthMode::Unbounded)
    }

    fn run_scan(&self, root: &str, extension: &str, mode: DepthMode) -> Result<ScanSummary> {
        Ok(TreeScanner::new(&self.ignore, &self.results).run(root, extension, mode)?)
    }

    /// Run a scan on the blocking pool.
    ///
    /// The scan uses a snapshot of the ignore registry taken now.
    pub fn spawn_scan(
        &self,
        root: impl Into<String>,
        extension: impl Into<String>,
        mode: DepthMode,
    ) -> JoinHandle<Result<ScanSummary>> {
        let ignore = self.ignore.clone();
        let results = self.results();
        let root = root.into();
        let extension = extension.into();
        // Drop readiness before handing off, so a poll right after spawning
        // cannot see the previous pass as finished.
        results.begin_pass();
        tokio::task::spawn_blocking(move || -> Result<ScanSummary> {
            Ok(TreeScanner::new(&ignore, &results).run(&root, &extension, mode)?)
        })
    }

    /// Monitor config for this session's settings.
    pub fn monitor_config(
        &self,
        root: &str,
        output_dir: impl Into<PathBuf>,
        stop_sentinel: impl Into<PathBuf>,
    ) -> MonitorConfig {
        let mut config = MonitorConfig::new(root, output_dir).with_sentinel(stop_sentinel);
        config.poll_interval = self.poll_interval;
        config
    }

    /// Monitor `root` until `stop_sentinel` exists, logging into `output_dir`.
    ///
    /// Blocks for the lifetime of the monitor. Writes
    /// `output_dir/fileAdded.txt` and `output_dir/fileRemoved.txt`.
    pub fn start_monitor(
        &self,
        root: &str,
        output_dir: &Path,
        stop_sentinel: &Path,
    ) -> Result<MonitorSummary> {
        let config = self.monitor_config(root, output_dir, stop_sentinel);
        Ok(ChangeMonitor::new(config).run()?)
    }

    /// Run a monitor on the blocking pool.
    pub fn spawn_monitor(config: MonitorConfig) -> JoinHandle<Result<MonitorSummary>> {
        tokio::task::spawn_blocking(move || -> Result<MonitorSummary> {
            Ok(ChangeMonitor::new(config).run()?)
        })
    }

    /// Roots to index: the configured list, or local NTFS disks among `candidates`.
    pub fn index_roots<P: VolumeProbe + ?Sized>(
        config: &EngineConfig,
        candidates: &[String],
        probe: &P,
    ) -> Vec<String> {
        let roots = config
            .disk_list()
            .unwrap_or_else(|| select_index_roots(candidates, probe));
        info!("Index roots: {}", roots.join(","));
        roots
    }
}

impl Default for FileEngine {
    fn default() -> Self {
        Self::new()
    }
}
