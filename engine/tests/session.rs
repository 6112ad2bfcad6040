//! Host-level behavior of an engine session.

use std::fs;
use std::path::{MAIN_SEPARATOR, Path};
use std::time::Duration;

use file_engine::{ChangeLog, ChangeMonitor, DepthMode, FileEngine, MonitorConfig};
use file_engine_directory_watcher::{RawAction, RawRecord, ReplaySource, decoder::encode};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SEP: char = MAIN_SEPARATOR;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

/// Engine whose depth limit reaches two levels below `root`.
fn engine_for(root: &str) -> FileEngine {
    let mut engine = FileEngine::new();
    engine.set_depth_limit(root.matches(SEP).count() + 3);
    engine
}

fn fixture() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("x.txt"));
    touch(&dir.path().join("sub").join("y.txt"));
    let root = dir.path().to_string_lossy().into_owned();
    (dir, root)
}

#[test]
fn test_scan_then_pull() {
    let (_dir, root) = fixture();
    let engine = engine_for(&root);

    assert!(!engine.is_result_ready());
    engine.scan(&root, "").unwrap();

    assert!(engine.is_result_ready());
    assert_eq!(
        engine.pull_result_text(),
        format!("{root}{SEP}sub\n{root}{SEP}sub{SEP}y.txt\n{root}{SEP}x.txt\n")
    );
}

#[test]
fn test_scan_after_clear_is_identical() {
    let (_dir, root) = fixture();
    let engine = engine_for(&root);

    engine.scan(&root, "").unwrap();
    let first = engine.pull_result_text();

    engine.clear_results();
    assert!(!engine.is_result_ready());
    assert_eq!(engine.pull_result_text(), "");

    engine.scan(&root, "").unwrap();
    assert_eq!(engine.pull_result_text(), first);
}

#[test]
fn test_ignored_root_lists_only_its_own_children() {
    let (_dir, root) = fixture();
    let mut engine = engine_for(&root);
    engine.add_ignore_path(&root.to_uppercase());

    engine.scan_unbounded(&root, "").unwrap();
    assert_eq!(
        engine.pull_result_text(),
        format!("{root}{SEP}sub\n{root}{SEP}x.txt\n")
    );
}

#[tokio::test]
async fn test_spawned_scan_becomes_ready() {
    let (_dir, root) = fixture();
    let engine = engine_for(&root);

    let handle = engine.spawn_scan(root.clone(), "txt", DepthMode::Unbounded);
    let summary = handle.await.unwrap().unwrap();

    assert!(engine.is_result_ready());
    assert_eq!(summary.entries, 1);
    assert_eq!(engine.pull_result_text(), format!("{root}{SEP}x.txt\n"));
}

#[test]
fn test_start_monitor_returns_when_sentinel_exists() {
    let watched = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let sentinel = out.path().join("CLOSE");
    fs::write(&sentinel, "").unwrap();

    let root = watched.path().to_string_lossy().into_owned();
    let summary = FileEngine::new()
        .start_monitor(&root, out.path(), &sentinel)
        .unwrap();

    assert_eq!(summary.lines_written, 0);
}

#[test]
fn test_start_monitor_missing_root_fails() {
    let out = TempDir::new().unwrap();
    let result = FileEngine::new().start_monitor(
        "/nonexistent/path/12345",
        out.path(),
        &out.path().join("CLOSE"),
    );
    assert!(result.is_err());
    assert!(!out.path().join(ChangeLog::Added.file_name()).exists());
}

#[test]
fn test_replayed_rename_reaches_both_logs() {
    let out = TempDir::new().unwrap();
    let config = MonitorConfig::new("C:\\", out.path());
    let buffer = encode(&[
        RawRecord::new(RawAction::Added, "$RECYCLE.BIN\\S-1\\x"),
        RawRecord::new(RawAction::RenamedOldName, "docs\\a.txt~"),
        RawRecord::new(RawAction::RenamedNewName, "docs\\b.txt"),
    ]);

    ChangeMonitor::new(config.clone())
        .run_with(ReplaySource::from_buffers(vec![buffer]))
        .unwrap();

    let read = |log| fs::read_to_string(config.log_path(log)).unwrap();
    assert_eq!(read(ChangeLog::Removed), "C:\\docs\\a.txt\n");
    assert_eq!(read(ChangeLog::Added), "C:\\docs\\b.txt\n");
}

#[tokio::test]
async fn test_spawned_monitor_stops_on_cancel() {
    let watched = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let token = CancellationToken::new();

    let config = MonitorConfig::new(watched.path().to_string_lossy(), out.path())
        .with_cancel_token(token.clone())
        .with_poll_interval(Duration::from_millis(20));
    let handle = FileEngine::spawn_monitor(config);

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(summary.malformed, 0);
}
