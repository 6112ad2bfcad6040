//! Incremental reader for the append-only change logs.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Lines handed out per poll unless configured otherwise.
pub const DEFAULT_MAX_BATCH: usize = 3000;

/// Follows one log file, returning lines appended since the previous poll.
///
/// Only newline-terminated lines are consumed; a line the writer has not
/// finished yet is picked up by a later poll.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
    max_batch: usize,
}

impl LogTailer {
    /// Follow `path` from its beginning.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            max_batch: DEFAULT_MAX_BATCH,
        }
    }

    /// Cap the number of lines consumed per poll.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// The followed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next batch of new lines, deduplicated, in first-seen order.
    ///
    /// A missing file yields an empty batch. A file shorter than the current
    /// position is assumed to have been truncated and is re-read from the start.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if file.metadata()?.len() < self.offset {
            debug!("Log truncated, rewinding: {}", self.path.display());
            self.offset = 0;
        }
        file.seek(SeekFrom::Start(self.offset))?;

        let mut reader = BufReader::new(file);
        let mut seen = HashSet::new();
        let mut lines = Vec::new();
        let mut consumed = 0;
        let mut buf = String::new();

        while consumed < self.max_batch {
            buf.clear();
            let n = reader.read_line(&mut buf)?;
            if n == 0 || !buf.ends_with('\n') {
                break;
            }
            self.offset += n as u64;
            consumed += 1;

            let line = buf.trim_end_matches(['\n', '\r']);
            if !line.is_empty() && seen.insert(line.to_string()) {
                lines.push(line.to_string());
            }
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn append(path: &Path, text: &str) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = LogTailer::new(temp_dir.path().join("fileAdded.txt"));
        assert!(tailer.poll().unwrap().is_empty());
    }

    #[test]
    fn test_returns_only_new_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fileAdded.txt");
        let mut tailer = LogTailer::new(&path);

        append(&path, "C:\\a\nC:\\b\n");
        assert_eq!(tailer.poll().unwrap(), vec!["C:\\a", "C:\\b"]);
        assert!(tailer.poll().unwrap().is_empty());

        append(&path, "C:\\c\n");
        assert_eq!(tailer.poll().unwrap(), vec!["C:\\c"]);
    }

    #[test]
    fn test_deduplicates_within_a_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fileAdded.txt");
        append(&path, "x\ny\nx\n");

        let mut tailer = LogTailer::new(&path);
        assert_eq!(tailer.poll().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_waits_for_unfinished_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fileRemoved.txt");
        let mut tailer = LogTailer::new(&path);

        append(&path, "done\npart");
        assert_eq!(tailer.poll().unwrap(), vec!["done"]);

        append(&path, "ial\n");
        assert_eq!(tailer.poll().unwrap(), vec!["partial"]);
    }

    #[test]
    fn test_batch_cap() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fileAdded.txt");
        append(&path, "1\n2\n3\n");

        let mut tailer = LogTailer::new(&path).with_max_batch(2);
        assert_eq!(tailer.poll().unwrap(), vec!["1", "2"]);
        assert_eq!(tailer.poll().unwrap(), vec!["3"]);
    }

    #[test]
    fn test_rewinds_after_truncation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fileAdded.txt");
        append(&path, "old line\n");

        let mut tailer = LogTailer::new(&path);
        tailer.poll().unwrap();

        std::fs::write(&path, "new\n").unwrap();
        assert_eq!(tailer.poll().unwrap(), vec!["new"]);
    }
}
