// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn install_creates_missing_settings_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("settings.json");

    let changed = install(&path, "tramuntana").expect("install");
    assert!(changed);

    let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    let entries = settings.pointer("/hooks/SessionStart").and_then(Value::as_array).expect("entries");
    assert_eq!(entries.len(), 1);
    let command = entries[0]["hooks"][0]["command"].as_str().expect("command");
    assert!(command.contains("tramuntana hook"));
}

#[test]
fn install_is_idempotent() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("settings.json");

    assert!(install(&path, "tramuntana").expect("first install"));
    assert!(!install(&path, "tramuntana").expect("second install"));

    let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    let entries = settings.pointer("/hooks/SessionStart").and_then(Value::as_array).expect("entries");
    assert_eq!(entries.len(), 1);
}

#[test]
fn install_preserves_existing_user_hooks() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("settings.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&json!({
            "hooks": {
                "SessionStart": [{
                    "matcher": "",
                    "hooks": [{"type": "command", "command": "some-other-tool --notify"}]
                }],
                "Stop": [{
                    "matcher": "",
                    "hooks": [{"type": "command", "command": "some-other-tool --on-stop"}]
                }]
            },
            "permissions": {"allow": ["Bash(ls:*)"]}
        }))
        .expect("serialize"),
    )
    .expect("write");

    assert!(install(&path, "tramuntana").expect("install"));

    let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("parse");
    let entries = settings.pointer("/hooks/SessionStart").and_then(Value::as_array).expect("entries");
    assert_eq!(entries.len(), 2);
    assert!(settings.pointer("/hooks/Stop").is_some());
    assert_eq!(
        settings.pointer("/permissions/allow/0").and_then(Value::as_str),
        Some("Bash(ls:*)")
    );
}

#[test]
fn already_installed_detects_marker_by_substring() {
    let settings = json!({
        "hooks": {
            "SessionStart": [{
                "matcher": "",
                "hooks": [{"type": "command", "command": "/usr/local/bin/tramuntana hook"}]
            }]
        }
    });
    assert!(already_installed(&settings));
}

#[test]
fn already_installed_is_false_on_empty_settings() {
    assert!(!already_installed(&json!({})));
}
