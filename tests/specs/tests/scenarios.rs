// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! S5/S6 from spec §8 — scenarios that need more than one module's
//! public surface at once, so they live here rather than alongside a
//! single module's unit tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tramuntana::delivery::chat_client::{ChatClient, ChatMessageID, ParseMode};
use tramuntana::delivery::task::{ContentType, DeliveryTask};
use tramuntana::delivery::DeliveryQueue;
use tramuntana::error::TramuntanaError;
use tramuntana::hook::lockfile::record_session;
use tramuntana::ids::{ChatID, TopicID, UserID, WindowID};
use tramuntana::monitor::model::{SessionMap, SessionMapEntry};
use tramuntana::registry::persist;

/// S5. Two concurrent hook invocations each add a distinct `SessionKey`
/// to `session_map.json`; after both complete, both entries are present
/// and the file still parses as JSON.
#[test]
fn s5_concurrent_hook_invocations_both_survive() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("session_map.json");

    let threads: Vec<_> = (0..2)
        .map(|i| {
            let path = path.clone();
            std::thread::spawn(move || {
                record_session(
                    &path,
                    format!("tramuntana:@{i}"),
                    SessionMapEntry {
                        session_id: format!("session-{i}"),
                        cwd: format!("/work/{i}"),
                        window_name: "agent".to_string(),
                    },
                )
            })
        })
        .collect();

    for t in threads {
        t.join().expect("hook thread panicked").expect("record_session");
    }

    let map: SessionMap = persist::load(&path).expect("session_map.json parses");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("tramuntana:@0").unwrap().session_id, "session-0");
    assert_eq!(map.get("tramuntana:@1").unwrap().session_id, "session-1");
}

#[derive(Default)]
struct RecordingChatClient {
    next_id: AtomicU64,
    sent: StdMutex<Vec<String>>,
}

#[async_trait]
impl ChatClient for RecordingChatClient {
    async fn send(
        &self,
        _chat_id: ChatID,
        _topic_id: &TopicID,
        text: &str,
        _parse_mode: ParseMode,
    ) -> Result<ChatMessageID, TramuntanaError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().expect("sent mutex").push(text.to_string());
        Ok(ChatMessageID(format!("msg-{id}")))
    }

    async fn edit(
        &self,
        _chat_id: ChatID,
        _message_id: &ChatMessageID,
        _text: &str,
        _parse_mode: ParseMode,
    ) -> Result<(), TramuntanaError> {
        Ok(())
    }

    async fn delete(&self, _chat_id: ChatID, _message_id: &ChatMessageID) -> Result<(), TramuntanaError> {
        Ok(())
    }

    async fn send_typing(&self, _chat_id: ChatID) -> Result<(), TramuntanaError> {
        Ok(())
    }
}

/// S6. A chat returns rate-limit during a content send; status_update
/// enqueues for that chat are dropped during the window, while content
/// enqueues are held and delivered afterward in the original order.
#[tokio::test]
async fn s6_flood_control_drops_status_holds_content_in_order() {
    let client = std::sync::Arc::new(RecordingChatClient::default());
    let queue = DeliveryQueue::new(client.clone(), CancellationToken::new());

    let user = UserID::from("100");
    let topic = TopicID::from("42");
    let chat_id = ChatID(7);

    // Simulate the rate-limit response the chat layer would have returned
    // from a prior content send for this chat.
    queue
        .flood_control()
        .mark_rate_limited(chat_id, Duration::from_millis(300));

    queue
        .enqueue(DeliveryTask {
            user: user.clone(),
            topic: topic.clone(),
            chat_id,
            window: WindowID::from("@1"),
            content_type: ContentType::StatusUpdate,
            parts: vec!["thinking...".to_string()],
            tool_use_id: None,
        })
        .await;

    queue
        .enqueue(DeliveryTask::content(
            user.clone(),
            topic.clone(),
            chat_id,
            WindowID::from("@1"),
            "first".to_string(),
        ))
        .await;
    queue
        .enqueue(DeliveryTask::content(
            user,
            topic,
            chat_id,
            WindowID::from("@2"),
            "second".to_string(),
        ))
        .await;

    // Window is 300ms; give the worker time to drain past it.
    tokio::time::sleep(Duration::from_millis(800)).await;

    let sent = client.sent.lock().expect("sent mutex").clone();
    assert_eq!(sent, vec!["first".to_string(), "second".to_string()]);
}
