// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory-locked read-modify-write on `session_map.json` (spec §4.2,
//! invariant I3). Grounded on `transport::inbox::write_inject_entry`'s
//! `nix::fcntl::Flock` use, generalized from append-only JSONL to a
//! full read-modify-write of a JSON map under a sibling `.lock` file.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

use nix::fcntl::{Flock, FlockArg};

use crate::error::TramuntanaError;
use crate::ids::WindowID;
use crate::monitor::model::{SessionMap, SessionMapEntry};

/// Acquire an exclusive lock on `<path>.lock`, then read-modify-write
/// `path` by inserting `entry` under `key`. The lock is held for the
/// duration of the full read + merge + atomic write, so two concurrent
/// hook invocations never observe a half-merged map (I3).
pub fn record_session(path: &Path, key: String, entry: SessionMapEntry) -> Result<(), TramuntanaError> {
    let lock_path = path.with_extension("json.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| TramuntanaError::new(crate::error::ErrorCategory::Filesystem, e.to_string()))?;

    let _guard = Flock::lock(lock_file, FlockArg::LockExclusive)
        .map_err(|(_file, errno)| TramuntanaError::lock_contention(format!("{}: {errno}", lock_path.display())))?;

    let mut map: SessionMap = crate::registry::persist::load(path)?;
    map.insert(key, entry);
    crate::registry::persist::save(path, &map)?;
    Ok(())
}

/// Drop every `SessionMapEntry` whose `SessionKey` resolves to one of
/// `dropped_windows` (spec §4.1 reconciliation step 2/3's "delete matching
/// SessionMapEntry"). Callers pass exactly the windows `Registry::reconcile`
/// classified as `Drop` — re-resolved windows keep their entry, since the
/// session behind them is still running, just under a new `WindowID`. Same
/// lock-then-read-modify-write shape as [`record_session`], reused by
/// `Registry`'s post-reconcile cleanup so the two files never drift apart.
/// Returns the removed keys for logging.
pub fn remove_dropped_windows(path: &Path, dropped_windows: &HashSet<WindowID>) -> Result<Vec<String>, TramuntanaError> {
    if dropped_windows.is_empty() {
        return Ok(Vec::new());
    }

    let lock_path = path.with_extension("json.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| TramuntanaError::new(crate::error::ErrorCategory::Filesystem, e.to_string()))?;

    let _guard = Flock::lock(lock_file, FlockArg::LockExclusive)
        .map_err(|(_file, errno)| TramuntanaError::lock_contention(format!("{}: {errno}", lock_path.display())))?;

    let mut map: SessionMap = crate::registry::persist::load(path)?;
    let stale: Vec<String> = map
        .keys()
        .filter(|key| dropped_windows.contains(&crate::ids::SessionKey(key.to_string()).window_id()))
        .cloned()
        .collect();
    for key in &stale {
        map.remove(key);
    }
    if !stale.is_empty() {
        crate::registry::persist::save(path, &map)?;
    }
    Ok(stale)
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
