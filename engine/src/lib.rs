//! # File Engine
//!
//! Host-facing session for the file-search index feeder. It combines:
//!
//! - **Tree scans**: bulk enumeration into a polled result buffer
//! - **Change monitors**: recursive watches streamed to append-only logs
//! - **Settings**: JSON config with ignore list, depth limit and disks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use file_engine::FileEngine;
//!
//! let mut engine = FileEngine::new();
//! engine.set_depth_limit(8);
//! engine.add_ignore_path("C:\\Windows");
//! engine.scan("C:", "")?;
//! if engine.is_result_ready() {
//!     let text = engine.pull_result_text();
//! }
//! ```

pub mod config;
pub mod error;
pub mod platform;
pub mod session;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use platform::{VolumeProbe, WindowClassifier, WindowHandle, select_index_roots};
pub use session::FileEngine;

// Re-export from dependencies for convenience
pub use file_engine_directory_watcher::{
    ChangeLog, ChangeMonitor, LogTailer, MonitorConfig, MonitorSummary,
};
pub use file_engine_scanner::{DepthMode, IgnoreRegistry, ResultBuffer, ScanSummary};
