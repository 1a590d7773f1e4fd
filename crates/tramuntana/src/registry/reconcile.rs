// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The recovery algorithm (spec §4.1). Runs on startup and after severe
//! errors to reconcile the persisted Binding Registry against the set of
//! windows the multiplexer currently reports live.

use std::collections::HashMap;

use crate::ids::WindowID;

use super::model::LiveWindow;

/// `nameToID`: last write wins for duplicate display names, matching the
/// spec's stated tie-break.
pub fn name_to_id(live_windows: &[LiveWindow]) -> HashMap<String, WindowID> {
    let mut map = HashMap::new();
    for w in live_windows {
        map.insert(w.name.clone(), w.id.clone());
    }
    map
}

/// The outcome of classifying a single bound window against the live set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFate {
    /// The window is live; keep the binding as-is.
    Keep,
    /// The window died but its DisplayName now belongs to a different live
    /// window; move state there.
    ReResolve(WindowID),
    /// The window is gone and no same-named live window exists; drop it.
    Drop,
}

/// Classify one previously-bound `WindowID` per the algorithm in spec
/// §4.1 step 2.
pub fn classify(
    window: &WindowID,
    display_name: Option<&str>,
    live_ids: &std::collections::HashSet<WindowID>,
    name_to_id: &HashMap<String, WindowID>,
) -> WindowFate {
    if live_ids.contains(window) {
        return WindowFate::Keep;
    }
    if let Some(name) = display_name {
        if let Some(new_id) = name_to_id.get(name) {
            if new_id != window {
                return WindowFate::ReResolve(new_id.clone());
            }
        }
    }
    WindowFate::Drop
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
