// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The entry pipeline: turns one parsed `Entry` into zero or more
//! window-scoped content messages, maintaining the `PendingTool` map
//! across polls (spec §4.3 "Entry pipeline", invariant P2/P5).

use std::collections::HashMap;

use super::entry::{Block, Entry, EntryKind};
use super::tool_summary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Content,
    ToolUse,
    ToolResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMessage {
    pub content_kind: ContentKind,
    pub text: String,
    pub tool_use_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PendingTool {
    pub name: String,
}

/// Process one entry against the live `PendingTool` map for its window,
/// returning the messages to enqueue and whether a user-text block was
/// observed (the caller uses this to stamp `TurnStart`).
pub fn process_entry(
    pending: &mut HashMap<String, PendingTool>,
    entry: &Entry,
) -> (Vec<WindowMessage>, bool) {
    let mut messages = Vec::new();
    let mut saw_user_text = false;

    for block in &entry.blocks {
        match block {
            Block::Text(text) => {
                let rendered = match entry.kind {
                    EntryKind::User => {
                        saw_user_text = true;
                        format!("**User:** {text}")
                    }
                    _ => text.clone(),
                };
                messages.push(WindowMessage {
                    content_kind: ContentKind::Content,
                    text: rendered,
                    tool_use_id: None,
                });
            }
            Block::Thinking(thinking) => {
                messages.push(WindowMessage {
                    content_kind: ContentKind::Content,
                    text: super::entry::format_thinking(thinking),
                    tool_use_id: None,
                });
            }
            Block::ToolUse { id, name, input } => {
                let summary = tool_summary::input_summary(name, input);
                pending.insert(id.clone(), PendingTool { name: name.clone() });
                messages.push(WindowMessage {
                    content_kind: ContentKind::ToolUse,
                    text: format!("{name}: {summary}"),
                    tool_use_id: Some(id.clone()),
                });
            }
            Block::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                if let Some(tool) = pending.remove(tool_use_id) {
                    let summary = tool_summary::result_summary(&tool.name, content, *is_error);
                    messages.push(WindowMessage {
                        content_kind: ContentKind::ToolResult,
                        text: format!("{}: {summary}", tool.name),
                        tool_use_id: Some(tool_use_id.clone()),
                    });
                } else if *is_error {
                    let summary = tool_summary::result_summary("unknown", content, true);
                    messages.push(WindowMessage {
                        content_kind: ContentKind::ToolResult,
                        text: format!("unknown: {summary}"),
                        tool_use_id: None,
                    });
                }
                // Non-error tool_result with no known tool_use is dropped.
            }
        }
    }

    (messages, saw_user_text)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
