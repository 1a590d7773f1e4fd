// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, Instant};

use super::*;

#[test]
fn take_returns_recorded_start_once() {
    let tracker = TurnTracker::new();
    let window = WindowID::from("@1");
    let start = Instant::now();
    tracker.record_start(&window, start);

    let taken = tracker.take(&window);
    assert_eq!(taken, Some(start));
    assert_eq!(tracker.take(&window), None);
}

#[test]
fn take_on_unknown_window_is_none() {
    let tracker = TurnTracker::new();
    let window = WindowID::from("@unknown");
    assert_eq!(tracker.take(&window), None);
}

#[test]
fn recording_again_overwrites_the_previous_start() {
    let tracker = TurnTracker::new();
    let window = WindowID::from("@1");
    let first = Instant::now();
    tracker.record_start(&window, first);
    let second = first + Duration::from_secs(5);
    tracker.record_start(&window, second);
    assert_eq!(tracker.take(&window), Some(second));
}
