// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A concrete [`ChatClient`]/[`ChatSource`] pair against the chat layer's
//! HTTP API (spec §6's abstract `sendMessage`/`editMessageText`/
//! `deleteMessage`/`sendChatAction`/`getUpdates`). Grounded on the
//! broker registration client's `reqwest::Client` + retry shape
//! (`broker::client::register`), generalized from one POST-and-forget
//! call to the small set of calls Delivery and Chat Intake need.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::delivery::chat_client::{ChatClient, ChatMessageID, ParseMode};
use crate::error::{classify_chat_error, ErrorCategory, TramuntanaError};
use crate::ids::{ChatID, TopicID};
use crate::intake::chat_source::ChatSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const POLL_TIMEOUT_SECS: u64 = 30;

pub struct BotApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl BotApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: format!("{}/bot{token}", base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Registers the bridge's slash commands (spec §4.6: `/new`, `/kill`,
    /// `/projects`) via `setCommandMenu` so the chat client surfaces them
    /// in its own command picker, independent of whether the user types
    /// them manually.
    pub async fn set_command_menu(&self) -> Result<(), TramuntanaError> {
        let commands = json!([
            { "command": "new", "description": "Bind this topic to a project (optionally named)" },
            { "command": "kill", "description": "Unbind this topic and kill its agent session" },
            { "command": "projects", "description": "List known projects" },
        ]);
        self.call("setMyCommands", json!({ "commands": commands })).await.map(|_| ())
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, TramuntanaError> {
        let resp = self
            .http
            .post(self.url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| TramuntanaError::new(classify_chat_error(&e.to_string()), e.to_string()))?;

        let status = resp.status();
        let parsed: ApiResponse = resp
            .json()
            .await
            .map_err(|e| TramuntanaError::new(ErrorCategory::ChatTransient, format!("decoding {method} response: {e}")))?;

        if !status.is_success() || !parsed.ok {
            let detail = parsed.description.unwrap_or_else(|| format!("HTTP {status}"));
            let category = classify_chat_error(&detail);
            if category == ErrorCategory::RateLimited {
                let retry_after = parsed.parameters.and_then(|p| p.retry_after).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(TramuntanaError::rate_limited(detail, retry_after));
            }
            return Err(TramuntanaError::new(category, detail));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

/// Fallback wait when a 429 response omits `parameters.retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

fn parse_mode_str(parse_mode: ParseMode) -> Option<&'static str> {
    match parse_mode {
        ParseMode::Rich => Some("MarkdownV2"),
        ParseMode::Plain => None,
    }
}

fn topic_field(topic: &TopicID) -> Option<i64> {
    topic.as_str().parse::<i64>().ok().filter(|id| *id != 0)
}

#[async_trait]
impl ChatClient for BotApiClient {
    async fn send(
        &self,
        chat_id: ChatID,
        topic_id: &TopicID,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<ChatMessageID, TramuntanaError> {
        let mut body = json!({ "chat_id": chat_id.0, "text": text });
        if let Some(thread_id) = topic_field(topic_id) {
            body["message_thread_id"] = json!(thread_id);
        }
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        let result = self.call("sendMessage", body).await?;
        let id = result
            .get("message_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| TramuntanaError::new(ErrorCategory::ChatTransient, "sendMessage: missing message_id"))?;
        Ok(ChatMessageID(id.to_string()))
    }

    async fn edit(
        &self,
        chat_id: ChatID,
        message_id: &ChatMessageID,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), TramuntanaError> {
        let mut body = json!({ "chat_id": chat_id.0, "message_id": message_id.0, "text": text });
        if let Some(mode) = parse_mode_str(parse_mode) {
            body["parse_mode"] = json!(mode);
        }
        self.call("editMessageText", body).await.map(|_| ())
    }

    async fn delete(&self, chat_id: ChatID, message_id: &ChatMessageID) -> Result<(), TramuntanaError> {
        let body = json!({ "chat_id": chat_id.0, "message_id": message_id.0 });
        self.call("deleteMessage", body).await.map(|_| ())
    }

    async fn send_typing(&self, chat_id: ChatID) -> Result<(), TramuntanaError> {
        let body = json!({ "chat_id": chat_id.0, "action": "typing" });
        self.call("sendChatAction", body).await.map(|_| ())
    }
}

#[async_trait]
impl ChatSource for BotApiClient {
    async fn poll_updates(&self, offset: i64) -> Result<(Vec<Value>, i64), TramuntanaError> {
        let body = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message", "callback_query"],
        });
        let result = self.call("getUpdates", body).await?;
        let updates = result.as_array().cloned().unwrap_or_default();
        let next_offset = updates
            .iter()
            .filter_map(|u| u.get("update_id").and_then(Value::as_i64))
            .max()
            .map(|max_id| max_id + 1)
            .unwrap_or(offset);
        Ok((updates, next_offset))
    }
}

#[cfg(test)]
#[path = "chat_api_tests.rs"]
mod tests;
