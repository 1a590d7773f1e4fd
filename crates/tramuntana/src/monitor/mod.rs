// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Monitor (spec §4.3): tails each live session's JSONL
//! transcript by byte offset, runs the entry pipeline, and routes the
//! resulting messages to the Outbound Delivery Queue through the
//! Binding Registry.

pub mod discover;
pub mod entry;
pub mod log_watch;
pub mod model;
pub mod pipeline;
pub mod tool_summary;
pub mod turn;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::delivery::task::{ContentType, DeliveryTask};
use crate::delivery::DeliveryQueue;
use crate::ids::{SessionID, SessionKey, WindowID};
use crate::registry::Registry;

use entry::Entry;
use log_watch::LogWatcher;
use model::{MonitorOffsetEntry, MonitorState, SessionMap};
use pipeline::PendingTool;
use turn::TurnTracker;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const PERSIST_EVERY_N_TICKS: u32 = 10;

struct TrackedSession {
    watcher: LogWatcher,
    last_mtime: Option<SystemTime>,
    session_id: String,
}

pub struct SessionMonitor {
    registry: Arc<Registry>,
    delivery: Arc<DeliveryQueue>,
    turns: Arc<TurnTracker>,
    session_map_path: PathBuf,
    monitor_state_path: PathBuf,
    projects_root: PathBuf,
    poll_interval: Duration,
    tracked: Mutex<HashMap<SessionKey, TrackedSession>>,
    pending_tools: Mutex<HashMap<WindowID, HashMap<String, PendingTool>>>,
    dirty: AtomicBool,
}

impl SessionMonitor {
    pub fn new(
        registry: Arc<Registry>,
        delivery: Arc<DeliveryQueue>,
        turns: Arc<TurnTracker>,
        session_map_path: PathBuf,
        monitor_state_path: PathBuf,
        projects_root: PathBuf,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            delivery,
            turns,
            session_map_path,
            monitor_state_path,
            projects_root,
            poll_interval,
            tracked: Mutex::new(HashMap::new()),
            pending_tools: Mutex::new(HashMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Load persisted offsets at startup, restoring each tracked
    /// session's `LogWatcher` at its last known byte offset.
    pub async fn load(&self) -> Result<(), crate::error::TramuntanaError> {
        let state: MonitorState = crate::registry::persist::load(&self.monitor_state_path)?;
        let mut tracked = self.tracked.lock().await;
        for (key, entry) in state.tracked_sessions {
            tracked.insert(
                SessionKey(key),
                TrackedSession {
                    watcher: LogWatcher::with_offset(
                        PathBuf::from(entry.file_path),
                        entry.last_byte_offset,
                    ),
                    last_mtime: None,
                    session_id: entry.session_id,
                },
            );
        }
        Ok(())
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        let mut tick_count: u32 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("session monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                    tick_count += 1;
                    if tick_count % PERSIST_EVERY_N_TICKS == 0 && self.dirty.load(Ordering::SeqCst) {
                        self.persist().await;
                    }
                }
            }
        }
        self.persist().await;
    }

    pub async fn tick(&self) {
        let session_map: SessionMap = match crate::registry::persist::load(&self.session_map_path) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to read session map");
                return;
            }
        };

        let mut tracked = self.tracked.lock().await;
        let present: HashSet<SessionKey> = session_map.keys().cloned().map(SessionKey).collect();

        for (key, entry) in &session_map {
            let session_key = SessionKey(key.clone());
            let window = session_key.window_id();
            let session_id = SessionID(entry.session_id.clone());

            let log_path = match tracked.get(&session_key) {
                Some(t) => t.watcher.path().to_path_buf(),
                None => match discover::discover_session_log(&self.projects_root, &session_id) {
                    Some(p) => p,
                    None => continue,
                },
            };

            let metadata = match std::fs::metadata(&log_path) {
                Ok(m) => m,
                Err(_) => continue,
            };
            let mtime = metadata.modified().ok();

            let state = tracked
                .entry(session_key.clone())
                .or_insert_with(|| TrackedSession {
                    watcher: LogWatcher::new(log_path.clone()),
                    last_mtime: None,
                    session_id: session_id.as_str().to_string(),
                });

            if state.last_mtime.is_some() && state.last_mtime == mtime {
                continue;
            }
            state.last_mtime = mtime;

            let lines = match state.watcher.read_new_lines() {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(window = %window, error = %e, "failed to tail session log");
                    continue;
                }
            };
            if lines.is_empty() {
                continue;
            }

            self.process_lines(&window, lines).await;
            self.dirty.store(true, Ordering::SeqCst);
        }

        let stale: Vec<SessionKey> = tracked
            .keys()
            .filter(|k| !present.contains(k))
            .cloned()
            .collect();
        for key in stale {
            tracked.remove(&key);
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    async fn process_lines(&self, window: &WindowID, lines: Vec<String>) {
        let consumers = self.registry.users_for_window(window).await;
        if consumers.is_empty() {
            return;
        }

        let mut pending_tools = self.pending_tools.lock().await;
        let pending = pending_tools.entry(window.clone()).or_default();

        for line in &lines {
            let entry = match entry::parse_line(line) {
                Ok(e) => e,
                Err(e) => {
                    warn!(window = %window, error = %e, "skipping malformed transcript line");
                    continue;
                }
            };
            if entry.blocks.is_empty() {
                continue;
            }
            self.route_entry(window, &entry, pending, &consumers).await;
        }
    }

    async fn route_entry(
        &self,
        window: &WindowID,
        entry: &Entry,
        pending: &mut HashMap<String, PendingTool>,
        consumers: &[(crate::ids::UserID, crate::ids::TopicID)],
    ) {
        let (messages, saw_user_text) = pipeline::process_entry(pending, entry);
        if saw_user_text {
            self.turns.record_start(window, std::time::Instant::now());
        }

        for message in messages {
            let content_type = match message.content_kind {
                pipeline::ContentKind::Content => ContentType::Content,
                pipeline::ContentKind::ToolUse => ContentType::ToolUse,
                pipeline::ContentKind::ToolResult => ContentType::ToolResult,
            };
            for (user, topic) in consumers {
                let Some(chat_id) = self.registry.chat_id(user, topic).await else {
                    continue;
                };
                self.delivery
                    .enqueue(DeliveryTask {
                        user: user.clone(),
                        topic: topic.clone(),
                        chat_id,
                        window: window.clone(),
                        content_type: content_type.clone(),
                        parts: vec![message.text.clone()],
                        tool_use_id: message.tool_use_id.clone(),
                    })
                    .await;
            }
        }
    }

    pub async fn persist(&self) {
        let tracked = self.tracked.lock().await;
        let mut tracked_sessions = HashMap::new();
        for (key, state) in tracked.iter() {
            tracked_sessions.insert(
                key.as_str().to_string(),
                MonitorOffsetEntry {
                    session_id: state.session_id.clone(),
                    file_path: state.watcher.path().display().to_string(),
                    last_byte_offset: state.watcher.offset(),
                },
            );
        }
        drop(tracked);
        let state = MonitorState { tracked_sessions };
        match crate::registry::persist::save(&self.monitor_state_path, &state) {
            Ok(()) => self.dirty.store(false, Ordering::SeqCst),
            Err(e) => warn!(error = %e, "monitor offset persist failed, will retry"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
