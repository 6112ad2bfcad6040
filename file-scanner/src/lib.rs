//! # File Scanner
//!
//! Bulk enumeration of a directory tree for the file engine.
//!
//! - **TreeScanner**: pre-order walk, depth-bounded or unbounded
//! - **IgnoreRegistry**: case-insensitive path fragments excluded from descent
//! - **ResultBuffer**: ordered results behind a readiness flag
//!
//! ```rust,ignore
//! use file_engine_scanner::{IgnoreRegistry, ResultBuffer, TreeScanner};
//!
//! let mut ignore = IgnoreRegistry::new();
//! ignore.add("C:\\Windows");
//! let results = ResultBuffer::new();
//! TreeScanner::new(&ignore, &results).scan("C:", "", 8)?;
//! let blob = results.consume();
//! ```

pub mod buffer;
pub mod error;
pub mod ignore;
pub mod scanner;

pub use buffer::ResultBuffer;
pub use error::{Result, ScanError};
pub use ignore::{IgnoreRegistry, RESERVED_MARKER};
pub use scanner::{DepthMode, ExtensionFilter, ScanSummary, TreeScanner, depth_exceeded};
