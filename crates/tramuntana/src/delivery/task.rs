// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::ids::{ChatID, TopicID, UserID, WindowID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    /// Transcript text or thinking preview.
    Content,
    ToolUse,
    ToolResult,
    StatusUpdate,
    StatusClear,
}

/// One unit of outbound work, enqueued by the Session Monitor or Status
/// Poller and consumed by a single per-user worker (spec §4.5).
#[derive(Debug, Clone)]
pub struct DeliveryTask {
    pub user: UserID,
    pub topic: TopicID,
    pub chat_id: ChatID,
    pub window: WindowID,
    pub content_type: ContentType,
    pub parts: Vec<String>,
    pub tool_use_id: Option<String>,
}

impl DeliveryTask {
    pub fn content(
        user: UserID,
        topic: TopicID,
        chat_id: ChatID,
        window: WindowID,
        text: String,
    ) -> Self {
        Self {
            user,
            topic,
            chat_id,
            window,
            content_type: ContentType::Content,
            parts: vec![text],
            tool_use_id: None,
        }
    }

    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}
