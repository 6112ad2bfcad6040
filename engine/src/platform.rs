//! Platform collaborators consumed by the engine.
//!
//! Volume and window queries are answered by the host; the engine only
//! calls them. Each is a single side-effect-free predicate.

/// Opaque OS window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub usize);

/// Answers questions about a volume root such as `C:\`.
pub trait VolumeProbe {
    /// Whether the volume is a local fixed disk.
    fn is_local_fixed_disk(&self, root: &str) -> bool;

    /// Whether the volume is formatted NTFS.
    fn is_ntfs(&self, root: &str) -> bool;
}

/// Classifies foreground windows for the search UI.
pub trait WindowClassifier {
    fn is_search_bar_window(&self, window: WindowHandle) -> bool;

    fn is_file_chooser_window(&self, window: WindowHandle) -> bool;

    fn is_explorer_window(&self, window: WindowHandle) -> bool;
}

/// Roots worth indexing by default: local fixed disks formatted NTFS.
pub fn select_index_roots<P: VolumeProbe + ?Sized>(
    candidates: &[String],
    probe: &P,
) -> Vec<String> {
    candidates
        .iter()
        .filter(|root| probe.is_ntfs(root) && probe.is_local_fixed_disk(root))
        .cloned()
        .collect()
}
