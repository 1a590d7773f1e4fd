// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-JSON update parsing (spec §4.6, §9 "dynamic map-of-any decoding").
//! The chat layer's typed model may omit `message_thread_id` and the
//! topic-close service message, so intake reads the raw update by
//! explicit path rather than through a typed schema.

use serde_json::Value;

use crate::ids::{ChatID, TopicID, UserID};

/// General-topic messages carry no `message_thread_id`; the chat layer's
/// convention is that topic 0 is the forum's default thread.
pub const GENERAL_TOPIC: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeEvent {
    Command {
        user: UserID,
        chat_id: ChatID,
        topic: TopicID,
        name: String,
        args: String,
    },
    Text {
        user: UserID,
        chat_id: ChatID,
        topic: TopicID,
        text: String,
    },
    Callback {
        user: UserID,
        chat_id: ChatID,
        topic: TopicID,
        data: String,
    },
    TopicClosed {
        chat_id: ChatID,
        topic: TopicID,
    },
}

/// Parse one raw `getUpdates` entry. Returns `None` for update kinds we
/// do not act on (e.g. edited messages, channel posts).
pub fn parse_update(raw: &Value) -> Option<IntakeEvent> {
    if let Some(message) = raw.get("message") {
        return parse_message(message);
    }
    if let Some(callback) = raw.get("callback_query") {
        return parse_callback(callback);
    }
    None
}

fn parse_message(message: &Value) -> Option<IntakeEvent> {
    let chat_id = ChatID(message.pointer("/chat/id")?.as_i64()?);
    let topic = TopicID::from(topic_id(message).to_string());

    if message.get("forum_topic_closed").is_some() {
        return Some(IntakeEvent::TopicClosed { chat_id, topic });
    }

    let user = UserID::from(message.pointer("/from/id")?.as_i64()?.to_string());
    let text = message.get("text")?.as_str()?.to_string();

    if let Some(rest) = text.strip_prefix('/') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_string();
        let args = parts.next().unwrap_or_default().trim().to_string();
        return Some(IntakeEvent::Command { user, chat_id, topic, name, args });
    }

    Some(IntakeEvent::Text { user, chat_id, topic, text })
}

fn parse_callback(callback: &Value) -> Option<IntakeEvent> {
    let chat_id = ChatID(callback.pointer("/message/chat/id")?.as_i64()?);
    let topic = TopicID::from(topic_id(callback.get("message")?).to_string());
    let user = UserID::from(callback.pointer("/from/id")?.as_i64()?.to_string());
    let data = callback.get("data")?.as_str()?.to_string();
    Some(IntakeEvent::Callback { user, chat_id, topic, data })
}

fn topic_id(message: &Value) -> i64 {
    message.get("message_thread_id").and_then(Value::as_i64).unwrap_or(GENERAL_TOPIC)
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
