// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive modal detection (spec §4.4 part 1). An ordered table of
//! `{name, top_markers, bot_markers}` patterns, evaluated in declaration
//! order with first-match-wins — the same "ordered signal table" shape as
//! the driver's own `DIALOG_SCREENS`, adapted from a signal-count
//! threshold to the spec's top/bot marker-pair algorithm.

pub struct ModalPattern {
    pub name: &'static str,
    pub top_markers: &'static [&'static str],
    pub bot_markers: &'static [&'static str],
}

pub const MODAL_PATTERNS: &[ModalPattern] = &[
    ModalPattern {
        name: "ExitPlanMode",
        top_markers: &["Would you like to proceed?", "Ready to code?"],
        bot_markers: &["Yes, and auto-accept edits", "No, keep planning"],
    },
    ModalPattern {
        name: "AskUserQuestion",
        top_markers: &["Select an option", "Which approach"],
        bot_markers: &["Other (type your own answer)"],
    },
    ModalPattern {
        name: "PermissionPrompt",
        top_markers: &["wants to", "Do you want to"],
        bot_markers: &["Yes, and don't ask again", "No, and tell Claude what to do differently"],
    },
    ModalPattern {
        name: "RestoreCheckpoint",
        top_markers: &["Restore checkpoint", "Rewind conversation"],
        bot_markers: &["Restore code only", "Restore conversation only"],
    },
    ModalPattern {
        name: "Settings",
        top_markers: &["Settings", "Configure Claude Code"],
        bot_markers: &[],
    },
];

fn last_non_empty_index(lines: &[&str]) -> Option<usize> {
    lines.iter().enumerate().rev().find_map(|(i, l)| {
        if l.trim().is_empty() {
            None
        } else {
            Some(i)
        }
    })
}

/// Classify a captured pane against the ordered modal table. Patterns are
/// evaluated in declaration order; the first whose top marker precedes
/// its bot marker (or the last non-empty line, when `bot_markers` is
/// empty) wins.
pub fn classify(pane_text: &str) -> Option<&'static str> {
    let lines: Vec<&str> = pane_text.lines().collect();

    for pattern in MODAL_PATTERNS {
        let top_idx = lines
            .iter()
            .position(|l| pattern.top_markers.iter().any(|m| l.contains(m)));
        let Some(top_idx) = top_idx else { continue };

        if pattern.bot_markers.is_empty() {
            if let Some(last_idx) = last_non_empty_index(&lines) {
                if last_idx >= top_idx {
                    return Some(pattern.name);
                }
            }
            continue;
        }

        let bot_found = lines[top_idx..]
            .iter()
            .any(|l| pattern.bot_markers.iter().any(|m| l.contains(m)));
        if bot_found {
            return Some(pattern.name);
        }
    }
    None
}

#[cfg(test)]
#[path = "modal_tests.rs"]
mod tests;
