// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rate-limit tracking (spec §4.5 "Rate-limit handling", §7 category 3).
//! `IsFlooded` is consulted before expensive work so producers can skip it
//! without waiting on the worker.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::ids::ChatID;

#[derive(Default)]
pub struct FloodControl {
    until: Mutex<HashMap<ChatID, Instant>>,
}

impl FloodControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit rate-limit response: `until[chatID] = now + retryAfter`.
    pub fn mark_rate_limited(&self, chat_id: ChatID, retry_after: Duration) {
        self.until.lock().insert(chat_id, Instant::now() + retry_after);
    }

    pub fn is_flooded(&self, chat_id: &ChatID) -> bool {
        match self.until.lock().get(chat_id) {
            Some(deadline) => Instant::now() < *deadline,
            None => false,
        }
    }

    /// Seconds remaining until the flood window elapses, or `None` if not
    /// currently flooded.
    pub fn retry_after(&self, chat_id: &ChatID) -> Option<Duration> {
        self.until.lock().get(chat_id).and_then(|deadline| {
            let now = Instant::now();
            if now < *deadline {
                Some(*deadline - now)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
#[path = "flood_tests.rs"]
mod tests;
