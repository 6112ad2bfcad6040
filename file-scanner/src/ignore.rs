//! Registry of path fragments whose subtrees are not descended into.

use tracing::debug;

/// Any path containing this character is never descended into.
///
/// Covers system trash and other reserved trees regardless of the registry.
pub const RESERVED_MARKER: char = '$';

/// Append-only set of lowercase path fragments.
///
/// A path is ignored when it contains any fragment, compared
/// case-insensitively. The registry is small and consulted once per
/// directory, so membership is a linear scan.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRegistry {
    fragments: Vec<String>,
}

impl IgnoreRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment, lower-cased on insertion. Empty input is ignored.
    pub fn add(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        let fragment = path.to_lowercase();
        debug!("Ignoring paths containing {fragment}");
        self.fragments.push(fragment);
    }

    /// Register every item of a comma-separated list such as `"C:\\Windows,"`.
    pub fn extend_from_list(&mut self, list: &str) {
        for item in list.split(',').map(str::trim) {
            self.add(item);
        }
    }

    /// Whether descent below `path` is excluded.
    pub fn is_ignored(&self, path: &str) -> bool {
        if path.contains(RESERVED_MARKER) {
            return true;
        }
        let path = path.to_lowercase();
        self.fragments.iter().any(|f| path.contains(f.as_str()))
    }

    /// Registered fragments, in insertion order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
