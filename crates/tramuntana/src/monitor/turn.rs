// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TurnStart[windowID]` bookkeeping (spec §4.3 "Turn timing"): the
//! monitor records a timestamp on every user-text block; the poller
//! consumes it when it later observes status-cleared for that window,
//! to emit a "completed in Xs" message ahead of the clear.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

use crate::ids::WindowID;

#[derive(Default)]
pub struct TurnTracker {
    starts: Mutex<HashMap<WindowID, Instant>>,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self {
            starts: Mutex::new(HashMap::new()),
        }
    }

    pub fn record_start(&self, window: &WindowID, at: Instant) {
        self.starts.lock().insert(window.clone(), at);
    }

    /// Consume (remove and return) the recorded start for a window, if
    /// any. Intended to be called exactly once per completion.
    pub fn take(&self, window: &WindowID) -> Option<Instant> {
        self.starts.lock().remove(window)
    }
}

#[cfg(test)]
#[path = "turn_tests.rs"]
mod tests;
