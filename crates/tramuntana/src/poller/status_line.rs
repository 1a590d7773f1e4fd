// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status line extraction (spec §4.4 part 2). Finds the chrome separator
//! the agent renders between its output and its prompt, then looks around
//! it for a line starting with one of the spinner glyphs.

const SEPARATOR_CHARS: [char; 2] = ['─', '━'];
const SPINNER_GLYPHS: [char; 6] = ['·', '✻', '✽', '✶', '✳', '✢'];
const SEPARATOR_MIN_LEN: usize = 20;
const WINDOW_LINES: usize = 10;
const SEARCH_RADIUS: usize = 3;

fn is_separator(line: &str) -> bool {
    line.chars().filter(|c| SEPARATOR_CHARS.contains(c)).count() >= SEPARATOR_MIN_LEN
}

/// Locate the chrome separator within the last `WINDOW_LINES` lines.
/// Scans top-down for the topmost match; per spec, if none is found that
/// way a bottom-up scan is also attempted (kept as a distinct branch to
/// accommodate agent-UI variants that only the bottom-up scan catches).
fn find_separator_index(lines: &[&str]) -> Option<usize> {
    let start = lines.len().saturating_sub(WINDOW_LINES);
    let window = &lines[start..];

    if let Some(i) = window.iter().position(|l| is_separator(l)) {
        return Some(start + i);
    }
    window
        .iter()
        .rposition(|l| is_separator(l))
        .map(|i| start + i)
}

fn status_from_line(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if SPINNER_GLYPHS.contains(&first) {
        Some(trimmed[first.len_utf8()..].trim_start().to_string())
    } else {
        None
    }
}

/// Extract the live status text from a captured pane, or `None` if no
/// spinner line is present near the chrome separator.
pub fn extract_status(pane_text: &str) -> Option<String> {
    let lines: Vec<&str> = pane_text.lines().collect();
    let sep_idx = find_separator_index(&lines)?;

    let mut candidates = Vec::with_capacity(SEARCH_RADIUS * 2);
    for d in 1..=SEARCH_RADIUS {
        if sep_idx >= d {
            candidates.push(sep_idx - d);
        }
    }
    for d in 1..=SEARCH_RADIUS {
        if sep_idx + d < lines.len() {
            candidates.push(sep_idx + d);
        }
    }

    candidates.into_iter().find_map(|idx| status_from_line(lines[idx]))
}

#[cfg(test)]
#[path = "status_line_tests.rs"]
mod tests;
