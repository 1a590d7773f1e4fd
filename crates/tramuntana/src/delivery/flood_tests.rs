// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::thread::sleep;

use super::*;

#[test]
fn not_flooded_by_default() {
    let flood = FloodControl::new();
    assert!(!flood.is_flooded(&ChatID(1)));
}

#[test]
fn flooded_immediately_after_marking() {
    let flood = FloodControl::new();
    flood.mark_rate_limited(ChatID(1), Duration::from_millis(50));
    assert!(flood.is_flooded(&ChatID(1)));
    assert!(flood.retry_after(&ChatID(1)).is_some());
}

#[test]
fn clears_after_window_elapses() {
    let flood = FloodControl::new();
    flood.mark_rate_limited(ChatID(1), Duration::from_millis(10));
    sleep(Duration::from_millis(30));
    assert!(!flood.is_flooded(&ChatID(1)));
}

#[test]
fn flooding_is_per_chat() {
    let flood = FloodControl::new();
    flood.mark_rate_limited(ChatID(1), Duration::from_millis(50));
    assert!(!flood.is_flooded(&ChatID(2)));
}
