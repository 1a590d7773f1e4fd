// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::delivery::chat_client::{ChatClient, ChatMessageID, ParseMode};
use crate::delivery::DeliveryQueue;
use crate::error::TramuntanaError;
use crate::ids::ChatID;
use crate::monitor::turn::TurnTracker;
use crate::mux_client::{SpecialKey, WindowInfo};
use crate::poller::StatusPoller;
use crate::registry::Registry;
use catalog::{ProjectCatalog, ProjectSummary};

struct FakeMux;

#[async_trait]
impl Multiplexer for FakeMux {
    async fn session_exists(&self, _session: &str) -> Result<bool, TramuntanaError> {
        Ok(true)
    }
    async fn ensure_session(&self, _session: &str) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn list_windows(&self, _session: &str) -> Result<Vec<WindowInfo>, TramuntanaError> {
        Ok(vec![])
    }
    async fn new_window(&self, _s: &str, _n: &str, _c: &str, _cmd: &str) -> Result<String, TramuntanaError> {
        Ok("@1".to_string())
    }
    async fn send_keys(&self, _s: &str, _w: &str, _t: &str) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn send_enter(&self, _s: &str, _w: &str) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn send_keys_with_delay(&self, _s: &str, _w: &str, _t: &str, _d: u64) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn send_special_key(&self, _s: &str, _w: &str, _key: SpecialKey) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn capture_pane(&self, _s: &str, _w: &str) -> Result<String, TramuntanaError> {
        Ok(String::new())
    }
    async fn kill_window(&self, _s: &str, _w: &str) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn display_message(&self, _s: &str, _w: &str, _f: &str) -> Result<String, TramuntanaError> {
        Ok(String::new())
    }
}

struct FakeChatClient {
    sent: StdMutex<Vec<String>>,
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn send(
        &self,
        _chat_id: ChatID,
        _topic_id: &crate::ids::TopicID,
        text: &str,
        _parse_mode: ParseMode,
    ) -> Result<ChatMessageID, TramuntanaError> {
        self.sent.lock().expect("mutex").push(text.to_string());
        Ok(ChatMessageID("msg-0".to_string()))
    }
    async fn edit(&self, _c: ChatID, _m: &ChatMessageID, _t: &str, _p: ParseMode) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn delete(&self, _c: ChatID, _m: &ChatMessageID) -> Result<(), TramuntanaError> {
        Ok(())
    }
    async fn send_typing(&self, _c: ChatID) -> Result<(), TramuntanaError> {
        Ok(())
    }
}

struct FakeCatalog;

#[async_trait]
impl ProjectCatalog for FakeCatalog {
    async fn list(&self) -> Result<Vec<ProjectSummary>, TramuntanaError> {
        Ok(vec![])
    }
    async fn resolve(&self, project: &crate::ids::ProjectID) -> Result<ProjectSummary, TramuntanaError> {
        Err(TramuntanaError::new(crate::error::ErrorCategory::Configuration, format!("unknown {project}")))
    }
}

struct FakeSource {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatSource for FakeSource {
    async fn poll_updates(&self, offset: i64) -> Result<(Vec<serde_json::Value>, i64), TramuntanaError> {
        let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if call == 0 {
            let update = json!({
                "message": {
                    "chat": {"id": -1},
                    "message_thread_id": 1,
                    "from": {"id": 1},
                    "text": "/projects"
                }
            });
            Ok((vec![update], offset + 1))
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok((vec![], offset))
        }
    }
}

fn build_router(chat: Arc<FakeChatClient>) -> Arc<Router<FakeMux>> {
    let mux = Arc::new(FakeMux);
    let registry = Arc::new(Registry::new(
        std::env::temp_dir().join("intake-test-state.json"),
        std::env::temp_dir().join("intake-test-session-map.json"),
    ));
    let cancel = CancellationToken::new();
    let delivery = Arc::new(DeliveryQueue::new(chat, cancel));
    let turns = Arc::new(TurnTracker::new());
    let poller = Arc::new(Mutex::new(StatusPoller::new(
        mux.clone(),
        registry.clone(),
        delivery.clone(),
        turns,
        "tramuntana".to_string(),
        "claude".to_string(),
        std::env::temp_dir().join("intake-test-session-map.json"),
        Duration::from_secs(1),
    )));
    let catalog: Arc<dyn ProjectCatalog> = Arc::new(FakeCatalog);
    Arc::new(Router::new(
        mux,
        registry,
        delivery,
        poller,
        catalog,
        Arc::new(picker::PickerState::new()),
        Arc::new(bash_mode::BashModeTracker::new()),
        "tramuntana".to_string(),
        "claude".to_string(),
        std::collections::HashSet::new(),
    ))
}

#[tokio::test]
async fn run_dispatches_parsed_updates_and_advances_offset() {
    let chat = Arc::new(FakeChatClient { sent: StdMutex::new(Vec::new()) });
    let router = build_router(chat.clone());
    let source: Arc<dyn ChatSource> = Arc::new(FakeSource { calls: AtomicUsize::new(0) });
    let offset_path = std::env::temp_dir().join(format!("intake-test-offset-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&offset_path);
    let intake = Intake::new(source, router, offset_path.clone());

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(async move { intake.run(cancel_clone).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.expect("intake task joined");

    assert!(chat.sent.lock().expect("mutex").iter().any(|m| m.contains("No projects configured")));
    let saved: OffsetState = crate::registry::persist::load(&offset_path).expect("load offset");
    assert_eq!(saved.offset, 1);
    let _ = std::fs::remove_file(&offset_path);
}

#[tokio::test]
async fn cancellation_stops_the_loop_promptly() {
    let chat = Arc::new(FakeChatClient { sent: StdMutex::new(Vec::new()) });
    let router = build_router(chat);
    let source: Arc<dyn ChatSource> = Arc::new(FakeSource { calls: AtomicUsize::new(0) });
    let offset_path = std::env::temp_dir().join(format!("intake-test-offset-cancel-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&offset_path);
    let intake = Intake::new(source, router, offset_path.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let start = std::time::Instant::now();
    intake.run(cancel).await;
    assert!(start.elapsed() < Duration::from_millis(500));
    let _ = std::fs::remove_file(&offset_path);
}
