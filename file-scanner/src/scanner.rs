//! Recursive directory enumeration.
//!
//! Entries are recorded in pre-order: a directory's own path comes before its
//! children, and its subtree is finished before its next sibling. Whether a
//! directory's children are descended into is decided from the *parent*
//! directory's path, once per listing.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Instant;

use glob::{MatchOptions, Pattern};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::buffer::ResultBuffer;
use crate::error::{Result, ScanError};
use crate::ignore::IgnoreRegistry;

/// Whether a scan enforces the depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// Stop descending below directories deeper than the limit.
    Bounded(usize),

    /// Descend wherever the ignore registry allows.
    Unbounded,
}

/// Counters for one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Entries recorded.
    pub entries: usize,

    /// Directories listed.
    pub directories_listed: usize,

    /// Directories that could not be listed.
    pub directories_skipped: usize,
}

/// Entry-name filter applied to each directory listing.
///
/// `"txt"` keeps names matching `*.txt` (case-insensitive), directories
/// included; empty or `"*"` keeps everything.
#[derive(Debug, Clone)]
pub struct ExtensionFilter(Option<Pattern>);

impl ExtensionFilter {
    pub fn new(extension: &str) -> Result<Self> {
        if extension.is_empty() || extension == "*" {
            return Ok(Self(None));
        }
        Pattern::new(&format!("*.{extension}"))
            .map(|p| Self(Some(p)))
            .map_err(|source| ScanError::InvalidFilter {
                filter: extension.to_string(),
                source,
            })
    }

    pub fn matches(&self, name: &str) -> bool {
        const OPTIONS: MatchOptions = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.0
            .as_ref()
            .is_none_or(|p| p.matches_with(name, OPTIONS))
    }
}

/// Walks a tree into a [`ResultBuffer`], consulting an [`IgnoreRegistry`].
pub struct TreeScanner<'a> {
    ignore: &'a IgnoreRegistry,
    results: &'a ResultBuffer,
}

/// One directory whose listing is being recorded.
struct Frame {
    /// Recorded form, the prefix of every child entry.
    path: String,
    entries: std::vec::IntoIter<Listed>,
    descend: bool,
}

struct Listed {
    /// Lossy name, used for recording and filtering only.
    name: String,
    /// Walked path, used to list the entry if it is descended into.
    path: PathBuf,
    is_dir: bool,
}

impl<'a> TreeScanner<'a> {
    pub fn new(ignore: &'a IgnoreRegistry, results: &'a ResultBuffer) -> Self {
        Self { ignore, results }
    }

    /// Depth-bounded scan of `root`.
    pub fn scan(&self, root: &str, extension: &str, depth_limit: usize) -> Result<ScanSummary> {
        self.run(root, extension, DepthMode::Bounded(depth_limit))
    }

    /// Scan of `root` limited only by the ignore registry.
    pub fn scan_unbounded(&self, root: &str, extension: &str) -> Result<ScanSummary> {
        self.run(root, extension, DepthMode::Unbounded)
    }

    /// Record every entry under `root` into the result buffer.
    ///
    /// The buffer is not ready while this runs and becomes ready when it
    /// returns successfully.
    pub fn run(&self, root: &str, extension: &str, mode: DepthMode) -> Result<ScanSummary> {
        let filter = ExtensionFilter::new(extension)?;
        let start = Instant::now();
        self.results.begin_pass();
        info!("Start search: {root} ({mode:?})");

        let mut summary = ScanSummary::default();
        let mut stack: Vec<Frame> = Vec::new();
        let root = root.trim_end_matches(MAIN_SEPARATOR);
        if let Some(frame) = self.open(&listing_path(root), root, &filter, mode, &mut summary) {
            stack.push(frame);
        }

        loop {
            let next = {
                let Some(frame) = stack.last_mut() else {
                    break;
                };
                frame.entries.next().map(|entry| {
                    let path = format!("{}{MAIN_SEPARATOR}{}", frame.path, entry.name);
                    (entry.path, path, entry.is_dir && frame.descend)
                })
            };

            match next {
                None => {
                    stack.pop();
                }
                Some((dir, path, descend)) => {
                    self.results.push(path.clone());
                    summary.entries += 1;
                    if descend
                        && let Some(frame) = self.open(&dir, &path, &filter, mode, &mut summary)
                    {
                        stack.push(frame);
                    }
                }
            }
        }

        self.results.finish_pass();
        info!(
            "End search: {root}, {} entries in {:?}",
            summary.entries,
            start.elapsed()
        );
        Ok(summary)
    }

    /// List `dir` and decide, once, whether its subdirectories are descended into.
    ///
    /// `path` is the recorded form of `dir`; the ignore and depth checks run on it.
    fn open(
        &self,
        dir: &Path,
        path: &str,
        filter: &ExtensionFilter,
        mode: DepthMode,
        summary: &mut ScanSummary,
    ) -> Option<Frame> {
        let Some(entries) = list_dir(dir, filter) else {
            summary.directories_skipped += 1;
            return None;
        };
        summary.directories_listed += 1;

        let descend = !self.ignore.is_ignored(path)
            && match mode {
                DepthMode::Bounded(limit) => !depth_exceeded(path, limit),
                DepthMode::Unbounded => true,
            };

        Some(Frame {
            path: path.to_string(),
            entries: entries.into_iter(),
            descend,
        })
    }
}

/// Whether `path` sits deeper than a depth limit allows descending from.
pub fn depth_exceeded(path: &str, limit: usize) -> bool {
    let separators = path.matches(MAIN_SEPARATOR).count() as i64;
    separators > limit as i64 - 2
}

/// Path that lists the inside of `dir`.
///
/// The trailing separator keeps a drive such as `C:` from naming the drive's
/// current directory instead of its root, and turns an empty root into `/`.
fn listing_path(dir: &str) -> PathBuf {
    PathBuf::from(format!("{dir}{MAIN_SEPARATOR}"))
}

/// One level of `dir`, sorted by name. `None` if it cannot be listed.
fn list_dir(dir: &Path, filter: &ExtensionFilter) -> Option<Vec<Listed>> {
    let mut listed = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                debug!("Skipping unreadable directory {}: {e}", dir.display());
                return None;
            }
            Err(e) => {
                debug!("Skipping entry in {}: {e}", dir.display());
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        if name == "." || name == ".." || !filter.matches(&name) {
            continue;
        }
        let name = name.into_owned();
        listed.push(Listed {
            name,
            is_dir: entry.file_type().is_dir(),
            path: entry.into_path(),
        });
    }

    Some(listed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SEP: char = MAIN_SEPARATOR;

    fn root_of(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    /// A depth limit that lets a scan descend `levels` directories below `root`.
    fn limit_for(root: &str, levels: usize) -> usize {
        root.matches(SEP).count() + levels + 1
    }

    fn rel(root: &str, entries: Vec<String>) -> Vec<String> {
        entries
            .into_iter()
            .map(|e| e[root.len() + 1..].replace(SEP, "/"))
            .collect()
    }

    #[test]
    fn test_pre_order_with_directory_entries() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("x.txt"));
        touch(&dir.path().join("sub").join("y.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        let summary = TreeScanner::new(&ignore, &results)
            .scan(&root, "", limit_for(&root, 2))
            .unwrap();

        assert_eq!(summary.entries, 3);
        assert_eq!(
            results.consume(),
            format!("{root}{SEP}sub\n{root}{SEP}sub{SEP}y.txt\n{root}{SEP}x.txt\n")
        );
        assert!(results.is_ready());
    }

    #[test]
    fn test_depth_limit_records_but_does_not_descend() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a").join("b").join("c").join("deep.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        // Descend from the root only: `a` is listed, `a/b` recorded, `a/b` not opened.
        TreeScanner::new(&ignore, &results)
            .scan(&root, "", limit_for(&root, 1))
            .unwrap();

        assert_eq!(rel(&root, results.entries()), vec!["a", "a/b"]);
    }

    #[test]
    fn test_unbounded_scan_reaches_the_bottom() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a").join("b").join("c").join("deep.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "")
            .unwrap();

        assert_eq!(
            rel(&root, results.entries()),
            vec!["a", "a/b", "a/b/c", "a/b/c/deep.txt"]
        );
    }

    #[test]
    fn test_reserved_marker_stops_descent() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("$trash").join("inner").join("deep.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "")
            .unwrap();

        assert_eq!(rel(&root, results.entries()), vec!["$trash", "$trash/inner"]);
    }

    #[test]
    fn test_ignore_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Windows").join("System32").join("drivers").join("x.sys"));
        touch(&dir.path().join("Users").join("me").join("a.txt"));
        let root = root_of(&dir);

        let mut ignore = IgnoreRegistry::new();
        ignore.add(&format!("{root}{SEP}WINDOWS").to_uppercase());
        let results = ResultBuffer::new();
        TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "")
            .unwrap();

        assert_eq!(
            rel(&root, results.entries()),
            vec![
                "Users",
                "Users/me",
                "Users/me/a.txt",
                "Windows",
                "Windows/System32",
            ]
        );
    }

    #[test]
    fn test_extension_filter_applies_per_listing() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.txt"));
        touch(&dir.path().join("B.TXT"));
        touch(&dir.path().join("c.rs"));
        touch(&dir.path().join("sub").join("hidden.txt"));
        touch(&dir.path().join("notes.txt").join("inner.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "txt")
            .unwrap();

        assert_eq!(
            rel(&root, results.entries()),
            vec!["B.TXT", "a.txt", "notes.txt", "notes.txt/inner.txt"]
        );
    }

    #[test]
    fn test_unlistable_root_is_skipped() {
        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        let summary = TreeScanner::new(&ignore, &results)
            .scan_unbounded("/nonexistent/path/12345", "")
            .unwrap();

        assert_eq!(summary.directories_skipped, 1);
        assert!(results.is_empty());
        assert!(results.is_ready());
    }

    #[test]
    fn test_rescans_accumulate_until_cleared() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("x.txt"));
        touch(&dir.path().join("sub").join("y.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        let scanner = TreeScanner::new(&ignore, &results);

        scanner.scan_unbounded(&root, "").unwrap();
        let first = results.consume();
        scanner.scan_unbounded(&root, "").unwrap();
        assert_eq!(results.len(), 6);

        results.clear();
        scanner.scan_unbounded(&root, "").unwrap();
        assert_eq!(results.consume(), first);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loops_are_not_followed() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.txt"));
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "")
            .unwrap();

        assert_eq!(rel(&root, results.entries()), vec!["a.txt", "loop"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_directory_is_descended() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let bad = dir.path().join(OsStr::from_bytes(b"bad\xff"));
        fs::create_dir_all(bad.join("inner")).unwrap();
        fs::write(bad.join("f.txt"), "").unwrap();
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        let summary = TreeScanner::new(&ignore, &results)
            .scan_unbounded(&root, "")
            .unwrap();

        assert_eq!(summary.directories_skipped, 0);
        assert_eq!(
            rel(&root, results.entries()),
            vec!["bad\u{FFFD}", "bad\u{FFFD}/f.txt", "bad\u{FFFD}/inner"]
        );
    }

    #[test]
    fn test_listing_path_ends_in_separator() {
        assert_eq!(listing_path("C:"), PathBuf::from(format!("C:{SEP}")));
        assert_eq!(listing_path(""), PathBuf::from(SEP.to_string()));
    }

    #[test]
    fn test_trailing_separator_on_root_is_equivalent() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("sub").join("y.txt"));
        let root = root_of(&dir);

        let ignore = IgnoreRegistry::new();
        let plain = ResultBuffer::new();
        TreeScanner::new(&ignore, &plain)
            .scan_unbounded(&root, "")
            .unwrap();
        let trailing = ResultBuffer::new();
        TreeScanner::new(&ignore, &trailing)
            .scan_unbounded(&format!("{root}{SEP}"), "")
            .unwrap();

        assert_eq!(trailing.consume(), plain.consume());
        assert_eq!(
            plain.consume(),
            format!("{root}{SEP}sub\n{root}{SEP}sub{SEP}y.txt\n")
        );
    }

    #[test]
    fn test_not_ready_while_pass_is_in_flight() {
        let dir = TempDir::new().unwrap();
        for d in 0..20 {
            for f in 0..50 {
                touch(&dir.path().join(format!("d{d}")).join(format!("f{f}.txt")));
            }
        }
        let root = root_of(&dir);
        let total = 20 * 51;

        let ignore = IgnoreRegistry::new();
        let results = ResultBuffer::new();
        std::thread::scope(|s| {
            let scan = s.spawn(|| {
                TreeScanner::new(&ignore, &results)
                    .scan_unbounded(&root, "")
                    .unwrap()
            });

            // Readiness is only published after the last push, so a ready
            // buffer always holds the whole pass.
            loop {
                if results.is_ready() {
                    assert_eq!(results.len(), total);
                    break;
                }
                std::thread::yield_now();
            }
            assert_eq!(scan.join().unwrap().entries, total);
        });
    }

    #[test]
    fn test_depth_exceeded() {
        let path = format!("C:{SEP}a{SEP}b");
        assert!(!depth_exceeded(&path, 4));
        assert!(depth_exceeded(&path, 3));
        assert!(depth_exceeded("C:", 1));
    }

    #[test]
    fn test_invalid_filter() {
        let err = ExtensionFilter::new("[").unwrap_err();
        assert!(matches!(err, ScanError::InvalidFilter { .. }));
    }
}
