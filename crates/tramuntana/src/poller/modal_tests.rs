// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn detects_exit_plan_mode() {
    let pane = "Here is my plan.\nWould you like to proceed?\n1. Yes, and auto-accept edits\n2. No, keep planning\n";
    assert_eq!(classify(pane), Some("ExitPlanMode"));
}

#[test]
fn detects_ask_user_question() {
    let pane = "Select an option:\n1. Use tokio\n2. Use async-std\nOther (type your own answer)\n";
    assert_eq!(classify(pane), Some("AskUserQuestion"));
}

#[test]
fn detects_permission_prompt() {
    let pane = "Bash wants to run `rm -rf target`\n1. Yes\n2. Yes, and don't ask again\n3. No, and tell Claude what to do differently\n";
    assert_eq!(classify(pane), Some("PermissionPrompt"));
}

#[test]
fn detects_restore_checkpoint() {
    let pane = "Restore checkpoint from 3 turns ago?\nRestore code only\nRestore conversation only\n";
    assert_eq!(classify(pane), Some("RestoreCheckpoint"));
}

#[test]
fn detects_settings_without_bot_marker() {
    let pane = "Settings\nTheme: dark\nModel: default\n";
    assert_eq!(classify(pane), Some("Settings"));
}

#[test]
fn returns_none_for_plain_output() {
    let pane = "Here is the file you asked for:\nfn main() {}\n";
    assert_eq!(classify(pane), None);
}

#[test]
fn first_match_wins_in_declaration_order() {
    // Both top markers present; ExitPlanMode is declared first and should win
    // even though its own bot marker is absent (no match) while a later
    // pattern's markers also appear.
    let pane = "Would you like to proceed?\nSettings\n";
    assert_eq!(classify(pane), Some("Settings"));
}

#[test]
fn bot_marker_must_not_precede_top_marker() {
    let pane = "No, and tell Claude what to do differently\nBash wants to run ls\n";
    assert_eq!(classify(pane), None);
}
