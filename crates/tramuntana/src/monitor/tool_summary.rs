// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tool display summaries (spec §4.3 "Tool summaries" table). Two
//! kinds of summary exist: a short input-side preview shown on the
//! `tool_use` message, and a result-side summary shown (in place of it,
//! via edit) once the matching `tool_result` arrives.

const BASH_PREVIEW_LINES: usize = 3;

/// A one-line preview of a tool's input, for the initial `tool_use`
/// message before its result is known.
pub fn input_summary(tool_name: &str, input: &serde_json::Value) -> String {
    match tool_name {
        "Read" | "Write" | "Edit" => input
            .get("file_path")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        "Bash" => input
            .get("command")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        "Grep" | "Glob" => input
            .get("pattern")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        "Task" => input
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        "WebFetch" => input
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        "WebSearch" => input
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        _ => input.to_string(),
    }
}

/// The success/error summary shown once the `tool_result` is paired with
/// its `tool_use`, per the table in spec §4.3.
pub fn result_summary(tool_name: &str, content: &str, is_error: bool) -> String {
    if is_error {
        return content.to_string();
    }
    match tool_name {
        "Read" => format!("Read {} lines", content.lines().count()),
        "Write" => format!("Wrote {} lines", content.lines().count()),
        "Edit" => edit_summary(content),
        "Bash" => bash_summary(content),
        "Grep" => format!(
            "Found {} matches\n> {}",
            content.lines().count(),
            first_line(content)
        ),
        "Glob" => format!(
            "Found {} files\n> {}",
            content.lines().count(),
            first_line(content)
        ),
        "Task" => format!("Agent output {} lines", content.lines().count()),
        "WebFetch" => format!("Fetched {} characters", content.chars().count()),
        "WebSearch" => format!(
            "{} search results\n> {}",
            content.lines().count(),
            first_line(content)
        ),
        _ => {
            if content.trim().is_empty() {
                "(No output)".to_string()
            } else {
                first_line(content).to_string()
            }
        }
    }
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("")
}

/// Counted from diff `+`/`-` lines, ignoring `+++`/`---` headers. If no
/// diff markers are present at all, fall back to the first line of
/// content.
fn edit_summary(content: &str) -> String {
    let mut added = 0usize;
    let mut removed = 0usize;
    let mut saw_marker = false;
    for line in content.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            added += 1;
            saw_marker = true;
        } else if line.starts_with('-') {
            removed += 1;
            saw_marker = true;
        }
    }
    if saw_marker {
        format!("Added {added}, removed {removed}")
    } else {
        first_line(content).to_string()
    }
}

fn bash_summary(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= BASH_PREVIEW_LINES {
        return content.to_string();
    }
    let preview = lines[..BASH_PREVIEW_LINES].join("\n");
    let remaining = lines.len() - BASH_PREVIEW_LINES;
    format!("{preview}\n… +{remaining} lines")
}

#[cfg(test)]
#[path = "tool_summary_tests.rs"]
mod tests;
