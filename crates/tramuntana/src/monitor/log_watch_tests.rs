// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::*;

#[test]
fn reads_lines_appended_since_last_offset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    std::fs::write(&path, "{\"a\":1}\n").expect("write");

    let mut watcher = LogWatcher::new(path.clone());
    let first = watcher.read_new_lines().expect("read");
    assert_eq!(first, vec!["{\"a\":1}".to_string()]);

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("open append");
    writeln!(file, "{{\"a\":2}}").expect("append");

    let second = watcher.read_new_lines().expect("read");
    assert_eq!(second, vec!["{\"a\":2}".to_string()]);
}

#[test]
fn offset_is_monotone_under_append_p1() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    std::fs::write(&path, "line one\n").expect("write");

    let mut watcher = LogWatcher::new(path.clone());
    watcher.read_new_lines().expect("read");
    let offset_a = watcher.offset();

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("open append");
    writeln!(file, "line two").expect("append");
    watcher.read_new_lines().expect("read");
    let offset_b = watcher.offset();

    assert!(offset_b >= offset_a);
}

#[test]
fn truncation_resets_offset_to_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    std::fs::write(&path, "a very long first line indeed\n").expect("write");

    let mut watcher = LogWatcher::new(path.clone());
    watcher.read_new_lines().expect("read");
    assert!(watcher.offset() > 0);

    std::fs::write(&path, "x\n").expect("truncate");
    let lines = watcher.read_new_lines().expect("read after truncation");
    assert_eq!(lines, vec!["x".to_string()]);
}

#[test]
fn missing_file_yields_no_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.jsonl");
    let mut watcher = LogWatcher::new(path);
    assert!(watcher.read_new_lines().expect("read").is_empty());
}

#[test]
fn empty_lines_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    std::fs::write(&path, "one\n\n\ntwo\n").expect("write");
    let mut watcher = LogWatcher::new(path);
    let lines = watcher.read_new_lines().expect("read");
    assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
}
