// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn extracts_status_above_separator() {
    let pane = "output line 1\noutput line 2\n✻ Pondering…\n──────────────────────\n> ";
    assert_eq!(extract_status(pane).as_deref(), Some("Pondering…"));
}

#[test]
fn extracts_status_below_separator() {
    let pane = "──────────────────────\n✽ Working on it\n> ";
    assert_eq!(extract_status(pane).as_deref(), Some("Working on it"));
}

#[test]
fn returns_none_when_no_glyph_nearby() {
    let pane = "just some output\n──────────────────────\n> type here";
    assert_eq!(extract_status(pane), None);
}

#[test]
fn returns_none_when_no_separator_present() {
    let pane = "no separators anywhere in this pane at all";
    assert_eq!(extract_status(pane), None);
}

#[test]
fn only_searches_last_ten_lines() {
    let mut pane = String::new();
    pane.push_str("✻ stale status\n");
    for i in 0..12 {
        pane.push_str(&format!("filler {i}\n"));
    }
    pane.push_str("──────────────────────\n> ");
    assert_eq!(extract_status(&pane), None);
}
