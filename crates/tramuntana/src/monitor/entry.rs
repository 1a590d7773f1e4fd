// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing one JSONL line into an `Entry` and its content `Block`s (spec
//! §4.3 "Entry pipeline"). Grounded on the driver's own Claude transcript
//! parsing (`extract_assistant_text`, `parse_claude_state`), adapted from
//! a single flat `AgentState` into the richer block stream this bridge
//! needs to pair `tool_use`/`tool_result` across ticks.

use serde_json::Value;

use crate::error::{ErrorCategory, TramuntanaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Summary,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(String),
    Thinking(String),
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub kind: EntryKind,
    pub blocks: Vec<Block>,
}

/// Parse one JSONL line. Malformed JSON is a `ParseError`; the caller
/// skips the line and still advances the byte offset (spec §4.3 "Failure
/// semantics").
pub fn parse_line(line: &str) -> Result<Entry, TramuntanaError> {
    let json: Value = serde_json::from_str(line)
        .map_err(|e| TramuntanaError::new(ErrorCategory::ParseError, format!("{e}")))?;

    let kind = match json.get("type").and_then(|v| v.as_str()) {
        Some("user") => EntryKind::User,
        Some("assistant") => EntryKind::Assistant,
        Some("summary") => EntryKind::Summary,
        _ => EntryKind::Unknown,
    };

    if !matches!(kind, EntryKind::User | EntryKind::Assistant) {
        return Ok(Entry {
            kind,
            blocks: Vec::new(),
        });
    }

    let content = json
        .get("message")
        .and_then(|m| m.get("content"))
        .cloned()
        .unwrap_or(Value::Null);

    let blocks = parse_content(&content);
    Ok(Entry { kind, blocks })
}

fn parse_content(content: &Value) -> Vec<Block> {
    match content {
        Value::String(s) => vec![Block::Text(s.clone())],
        Value::Array(items) => items.iter().filter_map(parse_block).collect(),
        _ => Vec::new(),
    }
}

fn parse_block(item: &Value) -> Option<Block> {
    match item.get("type").and_then(|v| v.as_str())? {
        "text" => Some(Block::Text(
            item.get("text")?.as_str().unwrap_or("").to_string(),
        )),
        "thinking" => Some(Block::Thinking(
            item.get("thinking")?.as_str().unwrap_or("").to_string(),
        )),
        "tool_use" => Some(Block::ToolUse {
            id: item.get("id")?.as_str()?.to_string(),
            name: item.get("name")?.as_str()?.to_string(),
            input: item.get("input").cloned().unwrap_or(Value::Null),
        }),
        "tool_result" => Some(Block::ToolResult {
            tool_use_id: item.get("tool_use_id")?.as_str()?.to_string(),
            content: tool_result_text(item.get("content")),
            is_error: item
                .get("is_error")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }),
        _ => None,
    }
}

/// `tool_result.content` may be a plain string or an array of blocks
/// (typically `{type: "text", text: "..."}`); flatten to a single string.
fn tool_result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Truncate a thinking block to 500 chars and wrap it in an expandable
/// quote sentinel pair (spec §4.3, GLOSSARY "Expandable quote").
pub fn format_thinking(thinking: &str) -> String {
    let truncated: String = thinking.chars().take(500).collect();
    format!("<blockquote expandable>{truncated}</blockquote>")
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
