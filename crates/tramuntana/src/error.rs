// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy. Each variant corresponds to one row of the error
//! handling design: configuration, chat-transient, rate-limit, chat-format,
//! dead-window, JSONL parse, filesystem, and rendezvous lock contention.
//! Locality of recovery is the organizing principle: a category tells a
//! caller whether to retry, skip, or propagate fatally, not the full cause
//! chain (that's carried separately via `anyhow`/`source`).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    ChatTransient,
    RateLimited,
    ChatFormat,
    DeadWindow,
    ParseError,
    Filesystem,
    LockContention,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::ChatTransient => "chat_transient",
            Self::RateLimited => "rate_limited",
            Self::ChatFormat => "chat_format",
            Self::DeadWindow => "dead_window",
            Self::ParseError => "parse_error",
            Self::Filesystem => "filesystem",
            Self::LockContention => "lock_contention",
        }
    }

    /// Whether this category's tick should retry the same work on the next
    /// poll without advancing any cursor (spec §7 "Propagation").
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ChatTransient | Self::Filesystem | Self::LockContention
        )
    }

    /// Whether this category is fatal at startup and should abort the
    /// process rather than be logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct TramuntanaError {
    pub category: ErrorCategory,
    pub message: String,
    /// Seconds the chat layer asked the caller to wait before retrying,
    /// when `category` is `RateLimited` and the response carried a
    /// `parameters.retry_after` field (spec §4.5 `until[chatID] = now +
    /// retryAfter`). `None` when the category isn't rate-limiting, or the
    /// response didn't say.
    pub retry_after: Option<u64>,
}

impl TramuntanaError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn dead_window(window: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::DeadWindow,
            format!("window {window} is dead"),
        )
    }

    pub fn lock_contention(path: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::LockContention,
            format!("could not acquire lock at {path}"),
        )
    }

    /// A rate-limit error carrying the chat layer's own `retry_after`
    /// hint, in seconds.
    pub fn rate_limited(message: impl Into<String>, retry_after: u64) -> Self {
        Self {
            category: ErrorCategory::RateLimited,
            message: message.into(),
            retry_after: Some(retry_after),
        }
    }
}

impl fmt::Display for TramuntanaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl std::error::Error for TramuntanaError {}

/// Classify a raw error string from the chat layer's transport into a
/// category, by case-insensitive substring match. Mirrors the driver's
/// own `classify_error_detail` shape: cheap, resilient to minor wording
/// changes in the upstream error text.
pub fn classify_chat_error(detail: &str) -> ErrorCategory {
    let lower = detail.to_lowercase();
    if lower.contains("retry after") || lower.contains("too many requests") || lower.contains("429")
    {
        ErrorCategory::RateLimited
    } else if lower.contains("can't parse entities")
        || lower.contains("unsupported start tag")
        || lower.contains("message_markup_invalid")
    {
        ErrorCategory::ChatFormat
    } else if lower.contains("timed out")
        || lower.contains("connection reset")
        || lower.contains("timeout")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
    {
        ErrorCategory::ChatTransient
    } else {
        ErrorCategory::ChatTransient
    }
}

/// Classify a multiplexer command failure. Dead-window detection is
/// substring-based since the multiplexer's own error text is the only
/// signal available (spec §6 `isWindowDead(err)`).
pub fn classify_mux_error(detail: &str) -> ErrorCategory {
    let lower = detail.to_lowercase();
    if lower.contains("can't find window")
        || lower.contains("can't find session")
        || lower.contains("no such window")
        || lower.contains("session not found")
        || lower.contains("no current session")
    {
        ErrorCategory::DeadWindow
    } else {
        ErrorCategory::Filesystem
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
