// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent `--install` of the SessionStart hook into the agent's
//! settings file (spec §4.2). Grounded on `driver::claude::setup`'s
//! navigate-and-merge-into-`serde_json::Value` shape, generalized from
//! "merge an orchestrator's base settings" to "insert one hook entry if
//! not already present".

use std::path::Path;

use serde_json::{json, Value};

use crate::error::{ErrorCategory, TramuntanaError};

/// Substring searched for in an existing `hooks.SessionStart[].hooks[].command`
/// entry to decide whether this hook is already installed.
const HOOK_MARKER: &str = "tramuntana hook";

/// Insert a `SessionStart` hook invocation into the settings file at
/// `settings_path`, creating the file (and any missing `hooks`/
/// `SessionStart` structure) if absent. Returns `true` if the file was
/// modified, `false` if the hook was already present.
pub fn install(settings_path: &Path, hook_binary: &str) -> Result<bool, TramuntanaError> {
    let mut settings = read_settings(settings_path)?;

    if already_installed(&settings) {
        return Ok(false);
    }

    insert_hook(&mut settings, hook_binary);
    write_settings(settings_path, &settings)?;
    Ok(true)
}

fn read_settings(path: &Path) -> Result<Value, TramuntanaError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|e| TramuntanaError::new(ErrorCategory::ParseError, format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(json!({})),
        Err(e) => Err(TramuntanaError::new(ErrorCategory::Filesystem, format!("{}: {e}", path.display()))),
    }
}

fn write_settings(path: &Path, settings: &Value) -> Result<(), TramuntanaError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| TramuntanaError::new(ErrorCategory::Filesystem, format!("{}: {e}", parent.display())))?;
    }
    let contents = serde_json::to_string_pretty(settings)
        .map_err(|e| TramuntanaError::new(ErrorCategory::ParseError, e.to_string()))?;
    std::fs::write(path, contents)
        .map_err(|e| TramuntanaError::new(ErrorCategory::Filesystem, format!("{}: {e}", path.display())))
}

fn already_installed(settings: &Value) -> bool {
    settings
        .pointer("/hooks/SessionStart")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().any(|entry| entry_contains_marker(entry)))
        .unwrap_or(false)
}

fn entry_contains_marker(entry: &Value) -> bool {
    entry
        .get("hooks")
        .and_then(Value::as_array)
        .map(|hooks| {
            hooks.iter().any(|h| {
                h.get("command")
                    .and_then(Value::as_str)
                    .is_some_and(|cmd| cmd.contains(HOOK_MARKER))
            })
        })
        .unwrap_or(false)
}

/// Append a new `SessionStart` entry, creating `hooks`/`SessionStart`
/// along the way without disturbing any existing user hooks.
fn insert_hook(settings: &mut Value, hook_binary: &str) {
    let Some(root) = settings.as_object_mut() else {
        return;
    };
    let hooks = root.entry("hooks").or_insert_with(|| json!({}));
    let Some(hooks_obj) = hooks.as_object_mut() else {
        return;
    };
    let session_start = hooks_obj.entry("SessionStart").or_insert_with(|| json!([]));
    let Some(entries) = session_start.as_array_mut() else {
        return;
    };
    entries.push(json!({
        "matcher": "",
        "hooks": [{
            "type": "command",
            "command": format!("{hook_binary} hook")
        }]
    }));
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
