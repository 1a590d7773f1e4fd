// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::*;

#[test]
fn round_trip_preserves_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    let mut doc: HashMap<String, i64> = HashMap::new();
    doc.insert("a".to_string(), 1);
    doc.insert("b".to_string(), 2);

    save(&path, &doc).expect("save");
    let loaded: HashMap<String, i64> = load(&path).expect("load");
    assert_eq!(doc, loaded);
}

#[test]
fn missing_file_loads_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let loaded: HashMap<String, i64> = load(&path).expect("load default");
    assert!(loaded.is_empty());
}

#[test]
fn save_replaces_existing_file_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");

    let mut first: HashMap<String, i64> = HashMap::new();
    first.insert("x".to_string(), 1);
    save(&path, &first).expect("save first");

    let mut second: HashMap<String, i64> = HashMap::new();
    second.insert("x".to_string(), 2);
    save(&path, &second).expect("save second");

    let loaded: HashMap<String, i64> = load(&path).expect("load");
    assert_eq!(loaded.get("x"), Some(&2));
    assert!(!path.with_extension("tmp").exists());
}
