// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Outbound Delivery Queue: one bounded channel + one worker per
//! `UserID` (spec §4.5). Modeled as "actor per user" per the design notes
//! in spec §9: a bounded queue and a single serialized worker, the same
//! shape the broker uses for its per-pod health-check loop, specialized
//! here to per-user delivery state instead of per-pod liveness.

pub mod chat_client;
pub mod flood;
pub mod merge;
pub mod task;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ids::{TopicID, UserID};

use chat_client::{ChatClient, ChatMessageID, ParseMode};
use flood::FloodControl;
use task::{ContentType, DeliveryTask};

const CHANNEL_CAPACITY: usize = 100;
const TYPING_MARKER: &str = "esc to interrupt";
const FLOOD_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Fallback wait when a `RateLimited` error doesn't carry a `retry_after`
/// hint from the chat layer.
const DEFAULT_RATE_LIMIT_SECS: u64 = 2;

struct WorkerState {
    tool_message_ids: HashMap<String, ChatMessageID>,
    status_message_ids: HashMap<(UserID, TopicID), (ChatMessageID, String)>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            tool_message_ids: HashMap::new(),
            status_message_ids: HashMap::new(),
        }
    }
}

pub struct DeliveryQueue {
    senders: Mutex<HashMap<UserID, mpsc::Sender<DeliveryTask>>>,
    chat_client: Arc<dyn ChatClient>,
    flood: Arc<FloodControl>,
    cancel: CancellationToken,
}

impl DeliveryQueue {
    pub fn new(chat_client: Arc<dyn ChatClient>, cancel: CancellationToken) -> Self {
        Self {
            senders: Mutex::new(HashMap::new()),
            chat_client,
            flood: Arc::new(FloodControl::new()),
            cancel,
        }
    }

    pub fn flood_control(&self) -> Arc<FloodControl> {
        self.flood.clone()
    }

    /// Enqueue a task for delivery. Never blocks: a full per-user channel
    /// drops the task (logged).
    pub async fn enqueue(&self, task: DeliveryTask) {
        let user = task.user.clone();
        let sender = self.sender_for(&user).await;
        if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(task) {
            warn!(user = %user, "delivery channel full, dropping message");
        }
    }

    async fn sender_for(&self, user: &UserID) -> mpsc::Sender<DeliveryTask> {
        let mut senders = self.senders.lock().await;
        if let Some(tx) = senders.get(user) {
            return tx.clone();
        }
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        senders.insert(user.clone(), tx.clone());
        let chat_client = self.chat_client.clone();
        let flood = self.flood.clone();
        let cancel = self.cancel.clone();
        let user_for_task = user.clone();
        tokio::spawn(run_worker(user_for_task, rx, chat_client, flood, cancel));
        tx
    }
}

async fn run_worker(
    user: UserID,
    mut rx: mpsc::Receiver<DeliveryTask>,
    chat_client: Arc<dyn ChatClient>,
    flood: Arc<FloodControl>,
    cancel: CancellationToken,
) {
    let mut state = WorkerState::new();
    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(user = %user, "delivery worker draining current send before shutdown");
                break;
            }
            maybe_task = rx.recv() => match maybe_task {
                Some(t) => t,
                None => break,
            },
        };
        handle_task(&user, task, &mut rx, &mut state, &chat_client, &flood).await;
    }
}

async fn handle_task(
    user: &UserID,
    task: DeliveryTask,
    rx: &mut mpsc::Receiver<DeliveryTask>,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
) {
    match task.content_type {
        ContentType::StatusUpdate | ContentType::StatusClear => {
            if flood.is_flooded(&task.chat_id) {
                debug!(user = %user, "dropping status task during flood");
                return;
            }
        }
        _ => {
            while flood.is_flooded(&task.chat_id) {
                tokio::time::sleep(FLOOD_POLL_INTERVAL).await;
            }
        }
    }

    match task.content_type {
        ContentType::Content => handle_content(task, rx, state, chat_client, flood).await,
        ContentType::ToolUse => handle_tool_use(task, state, chat_client, flood).await,
        ContentType::ToolResult => handle_tool_result(task, state, chat_client, flood).await,
        ContentType::StatusUpdate => handle_status_update(task, state, chat_client, flood).await,
        ContentType::StatusClear => handle_status_clear(task, state, chat_client, flood).await,
    }
}

async fn handle_content(
    task: DeliveryTask,
    rx: &mut mpsc::Receiver<DeliveryTask>,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
) {
    let (merged, leftover) = merge::merge_peek(task.text(), &task.window, rx);
    let key = (task.user.clone(), task.topic.clone());
    let parts = merge::split_message(&merged, merge::MAX_BODY_LEN);
    let mut parts = parts.into_iter();

    // The first part replaces a pending status message (if any) via edit,
    // the same as an unpaginated body would; any pagination overflow is
    // sent as additional new messages (spec §4.5 "[i/N]" pagination).
    if let Some(first) = parts.next() {
        if let Some((message_id, _)) = state.status_message_ids.remove(&key) {
            if let Err(e) =
                send_with_fallback(chat_client, flood, SendOp::Edit(task.chat_id, message_id), &first).await
            {
                warn!(error = %e, user = %task.user, topic = %task.topic, "content edit failed");
            }
        } else if let Err(e) =
            send_with_fallback(chat_client, flood, SendOp::Send(task.chat_id, task.topic.clone()), &first).await
        {
            warn!(error = %e, user = %task.user, topic = %task.topic, "content send failed");
        }
    }

    for part in parts {
        if let Err(e) =
            send_with_fallback(chat_client, flood, SendOp::Send(task.chat_id, task.topic.clone()), &part).await
        {
            warn!(error = %e, user = %task.user, topic = %task.topic, "paginated content send failed");
        }
    }

    if let Some(next) = leftover {
        Box::pin(handle_task(&task.user, next, rx, state, chat_client, flood)).await;
    }
}

async fn handle_tool_use(
    task: DeliveryTask,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
) {
    let text = task.text();
    match send_with_fallback(chat_client, flood, SendOp::Send(task.chat_id, task.topic.clone()), &text).await {
        Ok(message_id) => {
            if let Some(id) = task.tool_use_id {
                state.tool_message_ids.insert(id, message_id);
            }
        }
        Err(e) => warn!(error = %e, user = %task.user, topic = %task.topic, "tool-use send failed"),
    }
}

async fn handle_tool_result(
    task: DeliveryTask,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
) {
    let text = task.text();
    if let Some(id) = &task.tool_use_id {
        if let Some(message_id) = state.tool_message_ids.remove(id) {
            if let Err(e) = send_with_fallback(chat_client, flood, SendOp::Edit(task.chat_id, message_id), &text).await
            {
                warn!(error = %e, user = %task.user, topic = %task.topic, "tool-result edit failed");
            }
            return;
        }
    }
    if let Err(e) = send_with_fallback(chat_client, flood, SendOp::Send(task.chat_id, task.topic.clone()), &text).await
    {
        warn!(error = %e, user = %task.user, topic = %task.topic, "tool-result send failed");
    }
}

async fn handle_status_update(
    task: DeliveryTask,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
) {
    let key = (task.user.clone(), task.topic.clone());
    let text = task.text();

    if text.contains(TYPING_MARKER) {
        if let Err(e) = chat_client.send_typing(task.chat_id).await {
            warn!(error = %e, user = %task.user, topic = %task.topic, "send_typing failed");
        }
    }

    if let Some((message_id, last_text)) = state.status_message_ids.get(&key) {
        if last_text == &text {
            return;
        }
        let message_id = message_id.clone();
        match send_with_fallback(chat_client, flood, SendOp::Edit(task.chat_id, message_id.clone()), &text).await {
            Ok(_) => {
                state.status_message_ids.insert(key, (message_id, text));
            }
            Err(e) => warn!(error = %e, user = %task.user, topic = %task.topic, "status-update edit failed"),
        }
        return;
    }

    match send_with_fallback(chat_client, flood, SendOp::Send(task.chat_id, task.topic.clone()), &text).await {
        Ok(message_id) => {
            state.status_message_ids.insert(key, (message_id, text));
        }
        Err(e) => warn!(error = %e, user = %task.user, topic = %task.topic, "status-update send failed"),
    }
}

async fn handle_status_clear(
    task: DeliveryTask,
    state: &mut WorkerState,
    chat_client: &Arc<dyn ChatClient>,
    _flood: &Arc<FloodControl>,
) {
    let key = (task.user.clone(), task.topic.clone());
    if let Some((message_id, _)) = state.status_message_ids.remove(&key) {
        if let Err(e) = chat_client.delete(task.chat_id, &message_id).await {
            warn!(error = %e, user = %task.user, topic = %task.topic, "status-clear delete failed");
        }
    }
}

enum SendOp {
    Send(crate::ids::ChatID, TopicID),
    Edit(crate::ids::ChatID, ChatMessageID),
}

/// Attempt rich formatting first; on a chat-format error, retry once as
/// plain text (spec §4.5 "Each send is attempted first with rich
/// formatting... on markup error, retried as plain text").
async fn send_with_fallback(
    chat_client: &Arc<dyn ChatClient>,
    flood: &Arc<FloodControl>,
    op: SendOp,
    text: &str,
) -> Result<ChatMessageID, crate::error::TramuntanaError> {
    let result = perform(chat_client, &op, text, ParseMode::Rich).await;
    match result {
        Ok(id) => Ok(id),
        Err(e) if e.category == crate::error::ErrorCategory::ChatFormat => {
            perform(chat_client, &op, text, ParseMode::Plain).await
        }
        Err(e) if e.category == crate::error::ErrorCategory::RateLimited => {
            let chat_id = match &op {
                SendOp::Send(chat_id, _) => *chat_id,
                SendOp::Edit(chat_id, _) => *chat_id,
            };
            let retry_after = e.retry_after.unwrap_or(DEFAULT_RATE_LIMIT_SECS);
            flood.mark_rate_limited(chat_id, Duration::from_secs(retry_after));
            Err(e)
        }
        Err(e) => Err(e),
    }
}

async fn perform(
    chat_client: &Arc<dyn ChatClient>,
    op: &SendOp,
    text: &str,
    parse_mode: ParseMode,
) -> Result<ChatMessageID, crate::error::TramuntanaError> {
    match op {
        SendOp::Send(chat_id, topic_id) => {
            chat_client.send(*chat_id, topic_id, text, parse_mode).await
        }
        SendOp::Edit(chat_id, message_id) => {
            chat_client
                .edit(*chat_id, message_id, text, parse_mode)
                .await
                .map(|_| message_id.clone())
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
