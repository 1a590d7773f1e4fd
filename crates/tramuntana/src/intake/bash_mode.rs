// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bash mode (spec §4.6): a leading `!` on a plain message sends `!`,
//! waits 1s, then sends the remainder with a delayed Enter, and starts a
//! capture worker that posts a summary of what the pane showed. A new
//! message in the same topic cancels any still-running capture worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::delivery::task::DeliveryTask;
use crate::delivery::DeliveryQueue;
use crate::error::TramuntanaError;
use crate::ids::{ChatID, TopicID, UserID, WindowID};
use crate::mux_client::Multiplexer;

const BANG_SETTLE_DELAY: Duration = Duration::from_secs(1);
const REMAINDER_ENTER_DELAY_MS: u64 = 500;
const CAPTURE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tracks the one live bash-mode capture worker per `(user, topic)`.
pub struct BashModeTracker {
    tokens: Mutex<HashMap<(UserID, TopicID), CancellationToken>>,
}

impl Default for BashModeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BashModeTracker {
    pub fn new() -> Self {
        Self { tokens: Mutex::new(HashMap::new()) }
    }

    /// Cancel any previous capture worker for `(user, topic)` and
    /// register a fresh token for the caller to spawn a new one under.
    pub async fn start(&self, user: UserID, topic: TopicID) -> CancellationToken {
        let mut tokens = self.tokens.lock().await;
        if let Some(prev) = tokens.remove(&(user.clone(), topic.clone())) {
            prev.cancel();
        }
        let token = CancellationToken::new();
        tokens.insert((user, topic), token.clone());
        token
    }

    /// Cancel the capture worker for `(user, topic)` if one is running,
    /// e.g. because the user sent a new message in the same topic.
    pub async fn cancel(&self, user: &UserID, topic: &TopicID) {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.remove(&(user.clone(), topic.clone())) {
            token.cancel();
        }
    }
}

/// Send the `!`, settle, then the remainder with its own delayed Enter.
pub async fn send_bang_sequence(
    mux: &dyn Multiplexer,
    session: &str,
    window: &WindowID,
    remainder: &str,
) -> Result<(), TramuntanaError> {
    mux.send_keys(session, window.as_str(), "!").await?;
    tokio::time::sleep(BANG_SETTLE_DELAY).await;
    mux.send_keys_with_delay(session, window.as_str(), remainder, REMAINDER_ENTER_DELAY_MS).await
}

/// Poll the pane until cancelled, then post the last capture as a
/// content message. Stops early on a capture error (e.g. dead window).
pub async fn run_capture_worker(
    mux: Arc<dyn Multiplexer>,
    delivery: Arc<DeliveryQueue>,
    cancel: CancellationToken,
    session: String,
    window: WindowID,
    user: UserID,
    topic: TopicID,
    chat_id: ChatID,
) {
    let mut last = String::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(CAPTURE_POLL_INTERVAL) => {
                match mux.capture_pane(&session, window.as_str()).await {
                    Ok(text) => last = text,
                    Err(_) => break,
                }
            }
        }
    }
    if !last.trim().is_empty() {
        delivery
            .enqueue(DeliveryTask::content(user, topic, chat_id, window, last))
            .await;
    }
}

#[cfg(test)]
#[path = "bash_mode_tests.rs"]
mod tests;
