// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Status Poller (spec §4.4): a per-tick scraper over live
//! multiplexer panes, extracting spinner status and interactive modal
//! UIs that the JSONL transcript never records.

pub mod debounce;
pub mod modal;
pub mod status_line;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::delivery::task::{ContentType, DeliveryTask};
use crate::delivery::DeliveryQueue;
use crate::ids::{TopicID, UserID, WindowID};
use crate::monitor::turn::TurnTracker;
use crate::mux_client::{is_window_dead, Multiplexer, SpecialKey};
use crate::registry::model::WindowState;
use crate::registry::Registry;

use debounce::MissTracker;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct TopicState {
    last_status: Option<String>,
    mirror: Option<&'static str>,
}

/// Maps an inline-keyboard callback name to the keystroke the multiplexer
/// should receive. Out-of-scope keyboard markup itself (spec §1) is the
/// caller's concern; this is just the name → keystroke table.
pub fn navigation_key(callback: &str) -> Option<SpecialKey> {
    match callback {
        "up" => Some(SpecialKey::Up),
        "down" => Some(SpecialKey::Down),
        "left" => Some(SpecialKey::Left),
        "right" => Some(SpecialKey::Right),
        "enter" => Some(SpecialKey::Enter),
        "escape" => Some(SpecialKey::Escape),
        "space" => Some(SpecialKey::Space),
        "tab" => Some(SpecialKey::Tab),
        _ => None,
    }
}

pub struct StatusPoller<M: Multiplexer> {
    mux: Arc<M>,
    registry: Arc<Registry>,
    delivery: Arc<DeliveryQueue>,
    turns: Arc<TurnTracker>,
    session_name: String,
    agent_command: String,
    session_map_path: PathBuf,
    poll_interval: Duration,
    miss: MissTracker,
    topic_state: HashMap<(UserID, TopicID), TopicState>,
}

impl<M: Multiplexer> StatusPoller<M> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mux: Arc<M>,
        registry: Arc<Registry>,
        delivery: Arc<DeliveryQueue>,
        turns: Arc<TurnTracker>,
        session_name: String,
        agent_command: String,
        session_map_path: PathBuf,
        poll_interval: Duration,
    ) -> Self {
        Self {
            mux,
            registry,
            delivery,
            turns,
            session_name,
            agent_command,
            session_map_path,
            poll_interval,
            miss: MissTracker::new(),
            topic_state: HashMap::new(),
        }
    }

    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("status poller shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Navigation callback dispatch: sends the mapped keystroke to the
    /// window, and for Enter/Escape additionally clears the mirror
    /// (spec §4.4 "Enter and Escape additionally clear the mirror").
    pub async fn handle_navigation(&mut self, user: &UserID, topic: &TopicID, window: &WindowID, callback: &str) {
        let Some(key) = navigation_key(callback) else {
            warn!(callback, "unknown navigation callback");
            return;
        };
        if let Err(e) = self
            .mux
            .send_special_key(&self.session_name, window.as_str(), key)
            .await
        {
            warn!(window = %window, error = %e, "failed to send navigation keystroke");
        }
        if matches!(key, SpecialKey::Enter | SpecialKey::Escape) {
            self.clear_mirror(user, topic).await;
        }
    }

    pub async fn tick(&mut self) {
        let windows = self.registry.bound_windows().await;
        for window in windows {
            self.poll_window(&window).await;
        }
    }

    async fn poll_window(&mut self, window: &WindowID) {
        let pane = match self
            .mux
            .capture_pane(&self.session_name, window.as_str())
            .await
        {
            Ok(p) => p,
            Err(e) if is_window_dead(&e) => {
                self.handle_dead_window(window).await;
                return;
            }
            Err(e) => {
                warn!(window = %window, error = %e, "pane capture failed");
                return;
            }
        };

        if let Some(pattern) = modal::classify(&pane) {
            self.handle_modal(window, &pane, pattern).await;
            return;
        }
        self.clear_modals_for_window(window).await;

        match status_line::extract_status(&pane) {
            Some(status) => {
                self.miss.hit(window);
                self.handle_status_found(window, status).await;
            }
            None if self.miss.miss(window) => {
                self.handle_status_cleared(window).await;
            }
            None => {}
        }
    }

    async fn handle_modal(&mut self, window: &WindowID, pane: &str, pattern: &'static str) {
        let tail: String = pane.lines().rev().take(6).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n");
        let mirror_text = format!("[{pattern}]\n{tail}");

        for (user, topic) in self.registry.users_for_window(window).await {
            let Some(chat_id) = self.registry.chat_id(&user, &topic).await else {
                continue;
            };
            let key = (user.clone(), topic.clone());
            let entry = self.topic_state.entry(key).or_default();
            if entry.mirror == Some(pattern) {
                continue;
            }
            entry.mirror = Some(pattern);
            self.delivery
                .enqueue(DeliveryTask {
                    user,
                    topic,
                    chat_id,
                    window: window.clone(),
                    content_type: ContentType::StatusUpdate,
                    parts: vec![mirror_text.clone()],
                    tool_use_id: None,
                })
                .await;
        }
    }

    async fn clear_modals_for_window(&mut self, window: &WindowID) {
        for (user, topic) in self.registry.users_for_window(window).await {
            self.clear_mirror(&user, &topic).await;
        }
    }

    async fn clear_mirror(&mut self, user: &UserID, topic: &TopicID) {
        let key = (user.clone(), topic.clone());
        let Some(state) = self.topic_state.get_mut(&key) else {
            return;
        };
        if state.mirror.take().is_none() {
            return;
        }
        let Some(chat_id) = self.registry.chat_id(user, topic).await else {
            return;
        };
        let Some(window) = self.registry.lookup(user, topic).await else {
            return;
        };
        self.delivery
            .enqueue(DeliveryTask {
                user: user.clone(),
                topic: topic.clone(),
                chat_id,
                window,
                content_type: ContentType::StatusClear,
                parts: vec![],
                tool_use_id: None,
            })
            .await;
    }

    async fn handle_status_found(&mut self, window: &WindowID, status: String) {
        for (user, topic) in self.registry.users_for_window(window).await {
            let Some(chat_id) = self.registry.chat_id(&user, &topic).await else {
                continue;
            };
            let key = (user.clone(), topic.clone());
            let entry = self.topic_state.entry(key).or_default();
            if entry.last_status.as_deref() == Some(status.as_str()) {
                continue;
            }
            entry.last_status = Some(status.clone());
            self.delivery
                .enqueue(DeliveryTask {
                    user,
                    topic,
                    chat_id,
                    window: window.clone(),
                    content_type: ContentType::StatusUpdate,
                    parts: vec![status.clone()],
                    tool_use_id: None,
                })
                .await;
        }
    }

    async fn handle_status_cleared(&mut self, window: &WindowID) {
        for (user, topic) in self.registry.users_for_window(window).await {
            let key = (user.clone(), topic.clone());
            let had_status = self
                .topic_state
                .get(&key)
                .is_some_and(|s| s.last_status.is_some());
            if !had_status {
                continue;
            }
            let Some(chat_id) = self.registry.chat_id(&user, &topic).await else {
                continue;
            };

            if let Some(start) = self.turns.take(window) {
                let elapsed = start.elapsed().as_secs_f64();
                self.delivery
                    .enqueue(DeliveryTask::content(
                        user.clone(),
                        topic.clone(),
                        chat_id,
                        window.clone(),
                        format!("Completed in {elapsed:.1}s"),
                    ))
                    .await;
            }

            self.delivery
                .enqueue(DeliveryTask {
                    user: user.clone(),
                    topic: topic.clone(),
                    chat_id,
                    window: window.clone(),
                    content_type: ContentType::StatusClear,
                    parts: vec![],
                    tool_use_id: None,
                })
                .await;
            if let Some(entry) = self.topic_state.get_mut(&key) {
                entry.last_status = None;
            }
        }
    }

    /// Dead-window path (spec §7 category 5): clean up registry + offsets
    /// + session-map entry for the window, then either auto-recreate (CWD
    /// known) or notify with a recovery hint. There is no buffered
    /// "pending text" to forward in this design — text is written straight
    /// to the pane via `send_keys_with_delay` rather than queued, so a
    /// death observed on a later poll tick has nothing in flight to
    /// replay; the recreated window starts from a clean prompt instead.
    async fn handle_dead_window(&mut self, window: &WindowID) {
        warn!(window = %window, "status poller observed dead window");
        let cwd = self
            .registry
            .window_state(window)
            .await
            .map(|s| s.cwd)
            .filter(|c| !c.is_empty());
        let display_name = self.registry.display_name(window).await;

        let recreated = match &cwd {
            Some(cwd) => self.try_recreate_window(window, cwd, display_name.as_deref()).await,
            None => None,
        };

        for (user, topic) in self.registry.users_for_window(window).await {
            let chat_id = self.registry.chat_id(&user, &topic).await;
            match &recreated {
                Some(new_window) => {
                    self.registry.bind(user.clone(), topic.clone(), new_window.clone()).await;
                    if let Some(chat_id) = chat_id {
                        self.delivery
                            .enqueue(DeliveryTask::content(
                                user.clone(),
                                topic.clone(),
                                chat_id,
                                new_window.clone(),
                                "Session died — reopened a fresh window in the same directory.".to_string(),
                            ))
                            .await;
                    }
                }
                None => {
                    if let Some(chat_id) = chat_id {
                        self.delivery
                            .enqueue(DeliveryTask::content(
                                user.clone(),
                                topic.clone(),
                                chat_id,
                                window.clone(),
                                "Session died — use /new to start another.".to_string(),
                            ))
                            .await;
                    }
                    self.registry.unbind(&user, &topic).await;
                    self.registry.remove_chat_id(&user, &topic).await;
                }
            }
            self.topic_state.remove(&(user, topic));
        }

        self.registry.remove_window_state(window).await;
        self.miss.remove(window);
        if let Some(new_window) = recreated {
            let cwd = cwd.unwrap_or_default();
            self.registry
                .set_window_state(new_window.clone(), WindowState { session_id: None, cwd })
                .await;
            if let Some(name) = display_name {
                self.registry.set_display_name(new_window, name).await;
            }
        }

        self.prune_session_map(window).await;
    }

    /// Attempts the CWD-known half of the dead-window path: a fresh window
    /// in the same directory running the configured agent command, same
    /// shape as `Router::bind_project`'s own `ensure_session` + `new_window`
    /// pair. Returns `None` (falling back to notify-only) on any mux error.
    async fn try_recreate_window(&self, dead: &WindowID, cwd: &str, display_name: Option<&str>) -> Option<WindowID> {
        let name = display_name.unwrap_or("session");
        if let Err(e) = self.mux.ensure_session(&self.session_name).await {
            warn!(window = %dead, error = %e, "ensure_session failed during dead-window recreate");
            return None;
        }
        match self.mux.new_window(&self.session_name, name, cwd, &self.agent_command).await {
            Ok(id) => {
                let new_window = WindowID::from(id);
                debug!(old = %dead, new = %new_window, cwd, "recreated window after death");
                Some(new_window)
            }
            Err(e) => {
                warn!(window = %dead, error = %e, "failed to recreate window after death");
                None
            }
        }
    }

    async fn prune_session_map(&self, window: &WindowID) {
        let mut dropped = HashSet::new();
        dropped.insert(window.clone());
        match crate::hook::lockfile::remove_dropped_windows(&self.session_map_path, &dropped) {
            Ok(removed) if !removed.is_empty() => {
                debug!(window = %window, count = removed.len(), "pruned session_map.json entry for dead window");
            }
            Ok(_) => {}
            Err(e) => warn!(window = %window, error = %e, "failed to prune session_map.json for dead window"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
