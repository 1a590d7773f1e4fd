// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content merge-peek and long-body pagination (spec §4.5).

use tokio::sync::mpsc;

use crate::ids::WindowID;

use super::task::{ContentType, DeliveryTask};

/// Merged bodies (and the pre-pagination cutoff) never exceed this many
/// characters.
pub const MAX_BODY_LEN: usize = 3800;

/// While the next queued task is also `Content` for the same window and
/// the merged body would stay within `MAX_BODY_LEN`, fold it in. Returns
/// the merged text plus any task pulled off the channel that did *not*
/// qualify for merging, which the caller must process next (since
/// `mpsc::Receiver` has no peek, we consume-then-carry).
pub fn merge_peek(
    mut text: String,
    window: &WindowID,
    receiver: &mut mpsc::Receiver<DeliveryTask>,
) -> (String, Option<DeliveryTask>) {
    loop {
        match receiver.try_recv() {
            Ok(next) if next.content_type == ContentType::Content && &next.window == window => {
                let candidate = format!("{text}\n{}", next.text());
                if candidate.chars().count() <= MAX_BODY_LEN {
                    text = candidate;
                } else {
                    return (text, Some(next));
                }
            }
            Ok(next) => return (text, Some(next)),
            Err(_) => return (text, None),
        }
    }
}

/// Pre-split a long body at newline boundaries, appending `[i/N]`
/// pagination suffixes. A single line longer than `max_len` is
/// hard-split on a char boundary rather than left unbounded.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let mut line = line;
        loop {
            let candidate_len = if current.is_empty() {
                line.chars().count()
            } else {
                current.chars().count() + 1 + line.chars().count()
            };
            if candidate_len <= max_len {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line);
                break;
            }
            if current.is_empty() {
                let split_at = line
                    .char_indices()
                    .nth(max_len)
                    .map(|(i, _)| i)
                    .unwrap_or(line.len());
                let (head, tail) = line.split_at(split_at);
                chunks.push(head.to_string());
                line = tail;
                if line.is_empty() {
                    break;
                }
                continue;
            } else {
                chunks.push(std::mem::take(&mut current));
                continue;
            }
        }
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    if chunks.len() <= 1 {
        return chunks;
    }

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("{chunk}\n[{}/{total}]", i + 1))
        .collect()
}

/// Strip a `[i/N]` pagination suffix line, for round-trip verification.
pub fn strip_pagination_suffix(part: &str) -> &str {
    match part.rsplit_once("\n[") {
        Some((body, suffix)) if suffix.ends_with(']') && suffix.contains('/') => body,
        _ => part,
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
