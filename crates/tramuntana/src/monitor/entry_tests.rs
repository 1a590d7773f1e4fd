// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_plain_string_content_as_single_text_block() {
    let line = r#"{"type":"user","message":{"content":"hello"}}"#;
    let entry = parse_line(line).expect("parse");
    assert_eq!(entry.kind, EntryKind::User);
    assert_eq!(entry.blocks, vec![Block::Text("hello".to_string())]);
}

#[test]
fn parses_tool_use_block() {
    let line = r#"{"type":"assistant","message":{"content":[
        {"type":"tool_use","id":"abc","name":"Bash","input":{"command":"ls"}}
    ]}}"#;
    let entry = parse_line(line).expect("parse");
    assert_eq!(entry.kind, EntryKind::Assistant);
    match &entry.blocks[0] {
        Block::ToolUse { id, name, input } => {
            assert_eq!(id, "abc");
            assert_eq!(name, "Bash");
            assert_eq!(input["command"], "ls");
        }
        other => panic!("unexpected block: {other:?}"),
    }
}

#[test]
fn parses_tool_result_block_with_array_content() {
    let line = r#"{"type":"user","message":{"content":[
        {"type":"tool_result","tool_use_id":"abc","is_error":false,"content":[{"type":"text","text":"ok"}]}
    ]}}"#;
    let entry = parse_line(line).expect("parse");
    match &entry.blocks[0] {
        Block::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            assert_eq!(tool_use_id, "abc");
            assert_eq!(content, "ok");
            assert!(!is_error);
        }
        other => panic!("unexpected block: {other:?}"),
    }
}

#[test]
fn summary_and_unknown_entries_carry_no_blocks() {
    let summary = parse_line(r#"{"type":"summary","summary":"x"}"#).expect("parse");
    assert_eq!(summary.kind, EntryKind::Summary);
    assert!(summary.blocks.is_empty());

    let unknown = parse_line(r#"{"type":"system-init"}"#).expect("parse");
    assert_eq!(unknown.kind, EntryKind::Unknown);
    assert!(unknown.blocks.is_empty());
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = parse_line("not json").unwrap_err();
    assert_eq!(err.category, crate::error::ErrorCategory::ParseError);
}

#[test]
fn format_thinking_truncates_to_500_chars() {
    let long = "x".repeat(600);
    let formatted = format_thinking(&long);
    assert!(formatted.starts_with("<blockquote expandable>"));
    assert!(formatted.contains(&"x".repeat(500)));
    assert!(!formatted.contains(&"x".repeat(501)));
}
