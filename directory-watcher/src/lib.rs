//! # Directory Watcher
//!
//! Recursive change monitoring for the file engine. A monitor watches one
//! tree and appends every change to two logs that the indexer tails.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  NotificationSource ──► decoder ──► ChangeMonitor ──► logs     │
//! │   (notify / replay)      │              │              │        │
//! │                          ▼              ▼              ▼        │
//! │                     rename pairs     filters       LogTailer   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Log lines go to `fileAdded.txt` (added, modified, renamed-to) and
//! `fileRemoved.txt` (removed, renamed-from) in the output directory.

pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod source;
pub mod tailer;
pub mod watcher;

pub use config::{MonitorConfig, StopCondition};
pub use error::{DecodeError, Result, WatcherError};
pub use event::{
    ADDED_LOG_NAME, ChangeAction, ChangeEvent, ChangeLog, Decoded, REMOVED_LOG_NAME, RawAction,
    RawRecord,
};
pub use source::{Batch, NotificationSource, NotifySource, ReplaySource};
pub use tailer::LogTailer;
pub use watcher::{ChangeMonitor, MonitorState, MonitorSummary};
