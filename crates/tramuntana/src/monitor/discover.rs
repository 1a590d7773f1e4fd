// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-log path discovery (spec §4.3 step 1.b) — grounded on
//! `driver::claude::resume::discover_session_log`, adapted from
//! "newest jsonl under a workspace-matching directory" to "the jsonl
//! file named for a known session id, scanned across all project dirs".

use std::path::{Path, PathBuf};

use crate::ids::SessionID;

/// Locate the transcript file for `session_id` under the agent's
/// `~/.claude/projects/*/` tree. Prefers an exact `<session_id>.jsonl`
/// match; falls back to scanning each project directory's files for one
/// whose stem equals the session id (covers index-file layouts).
pub fn discover_session_log(projects_root: &Path, session_id: &SessionID) -> Option<PathBuf> {
    let entries = std::fs::read_dir(projects_root).ok()?;
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let candidate = dir.join(format!("{}.jsonl", session_id.as_str()));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let entries = std::fs::read_dir(projects_root).ok()?;
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if let Ok(files) = std::fs::read_dir(&dir) {
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                    continue;
                }
                if path.file_stem().and_then(|s| s.to_str()) == Some(session_id.as_str()) {
                    return Some(path);
                }
            }
        }
    }
    None
}

/// Default projects root: `~/.claude/projects`.
pub fn default_projects_root() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    Path::new(&home).join(".claude").join("projects")
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
