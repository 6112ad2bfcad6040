//! Engine settings, stored as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Default recursion depth for bounded scans.
pub const DEFAULT_SEARCH_DEPTH: usize = 8;

/// Default comma-separated ignore list.
pub const DEFAULT_IGNORE_PATH: &str = "C:\\Windows,";

/// Settings for one engine session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Comma-separated path fragments excluded from descent.
    pub ignore_path: String,

    /// Depth limit for bounded scans.
    pub search_depth: usize,

    /// Comma-separated roots to index. None = pick local NTFS disks.
    pub disks: Option<String>,

    /// Directory receiving the change logs.
    pub output_dir: PathBuf,

    /// Upper bound on one monitor wait, in milliseconds (None = unbounded).
    pub poll_interval_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignore_path: DEFAULT_IGNORE_PATH.to_string(),
            search_depth: DEFAULT_SEARCH_DEPTH,
            disks: None,
            output_dir: PathBuf::from("tmp"),
            poll_interval_ms: None,
        }
    }
}

impl EngineConfig {
    /// Load settings from `path`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    /// Fields absent from the file keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Write settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set the depth limit.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Set the change log directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Configured roots, if any, split from the comma list.
    pub fn disk_list(&self) -> Option<Vec<String>> {
        self.disks.as_ref().map(|disks| {
            disks
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect()
        })
    }

    /// Monitor wait bound.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }
}
