// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::super::entry::parse_line;
use super::*;

#[test]
fn tool_pairing_across_ticks_s3() {
    let mut pending = HashMap::new();

    let tick1 = parse_line(
        r#"{"type":"assistant","message":{"content":[
            {"type":"tool_use","id":"X","name":"Bash","input":{"command":"ls"}}
        ]}}"#,
    )
    .expect("parse");
    let (messages1, _) = process_entry(&mut pending, &tick1);
    assert_eq!(messages1.len(), 1);
    assert_eq!(messages1[0].content_kind, ContentKind::ToolUse);
    assert_eq!(messages1[0].tool_use_id.as_deref(), Some("X"));
    assert!(pending.contains_key("X"));

    let tick2 = parse_line(
        r#"{"type":"user","message":{"content":[
            {"type":"tool_result","tool_use_id":"X","is_error":false,"content":"file.txt"}
        ]}}"#,
    )
    .expect("parse");
    let (messages2, _) = process_entry(&mut pending, &tick2);
    assert_eq!(messages2.len(), 1);
    assert_eq!(messages2[0].content_kind, ContentKind::ToolResult);
    assert_eq!(messages2[0].tool_use_id.as_deref(), Some("X"));
    assert!(messages2[0].text.starts_with("Bash:"));
    assert!(!pending.contains_key("X"));
}

#[test]
fn tool_result_without_known_use_and_no_error_is_dropped() {
    let mut pending = HashMap::new();
    let entry = parse_line(
        r#"{"type":"user","message":{"content":[
            {"type":"tool_result","tool_use_id":"unseen","is_error":false,"content":"x"}
        ]}}"#,
    )
    .expect("parse");
    let (messages, _) = process_entry(&mut pending, &entry);
    assert!(messages.is_empty());
}

#[test]
fn tool_result_without_known_use_but_error_emits_with_unknown_name() {
    let mut pending = HashMap::new();
    let entry = parse_line(
        r#"{"type":"user","message":{"content":[
            {"type":"tool_result","tool_use_id":"unseen","is_error":true,"content":"boom"}
        ]}}"#,
    )
    .expect("parse");
    let (messages, _) = process_entry(&mut pending, &entry);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].text.starts_with("unknown:"));
    assert!(messages[0].tool_use_id.is_none());
}

#[test]
fn user_text_block_signals_turn_start() {
    let mut pending = HashMap::new();
    let entry = parse_line(r#"{"type":"user","message":{"content":"go"}}"#).expect("parse");
    let (messages, saw_user_text) = process_entry(&mut pending, &entry);
    assert!(saw_user_text);
    assert_eq!(messages[0].text, "**User:** go");
}

#[test]
fn assistant_text_is_emitted_verbatim() {
    let mut pending = HashMap::new();
    let entry =
        parse_line(r#"{"type":"assistant","message":{"content":"Here's the answer"}}"#)
            .expect("parse");
    let (messages, saw_user_text) = process_entry(&mut pending, &entry);
    assert!(!saw_user_text);
    assert_eq!(messages[0].text, "Here's the answer");
}
