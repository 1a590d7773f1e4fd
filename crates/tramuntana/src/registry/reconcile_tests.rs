// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashSet;

use super::*;

fn live(id: &str, name: &str, cwd: &str) -> LiveWindow {
    LiveWindow {
        id: WindowID::from(id),
        name: name.to_string(),
        cwd: cwd.to_string(),
    }
}

#[test]
fn keeps_live_window() {
    let windows = vec![live("@3", "alpha", "/a")];
    let live_ids: HashSet<_> = windows.iter().map(|w| w.id.clone()).collect();
    let names = name_to_id(&windows);
    let fate = classify(&WindowID::from("@3"), Some("alpha"), &live_ids, &names);
    assert_eq!(fate, WindowFate::Keep);
}

#[test]
fn re_resolves_renamed_window() {
    let windows = vec![live("@7", "alpha", "/a")];
    let live_ids: HashSet<_> = windows.iter().map(|w| w.id.clone()).collect();
    let names = name_to_id(&windows);
    let fate = classify(&WindowID::from("@3"), Some("alpha"), &live_ids, &names);
    assert_eq!(fate, WindowFate::ReResolve(WindowID::from("@7")));
}

#[test]
fn drops_when_no_display_name_match() {
    let windows = vec![live("@7", "beta", "/a")];
    let live_ids: HashSet<_> = windows.iter().map(|w| w.id.clone()).collect();
    let names = name_to_id(&windows);
    let fate = classify(&WindowID::from("@3"), Some("alpha"), &live_ids, &names);
    assert_eq!(fate, WindowFate::Drop);
}

#[test]
fn drops_when_no_display_name_recorded() {
    let live_ids: HashSet<WindowID> = HashSet::new();
    let names = HashMap::new();
    let fate = classify(&WindowID::from("@3"), None, &live_ids, &names);
    assert_eq!(fate, WindowFate::Drop);
}

#[test]
fn duplicate_display_names_last_write_wins() {
    let windows = vec![live("@1", "dup", "/a"), live("@2", "dup", "/b")];
    let names = name_to_id(&windows);
    assert_eq!(names.get("dup"), Some(&WindowID::from("@2")));
}
