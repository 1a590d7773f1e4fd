// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Binding Registry: the persisted mapping between (user, topic) ↔
//! window ↔ agent session (spec §4.1). Guarded by its own `RwLock`, in the
//! same shape as the broker's `PodRegistry`: readers never block on a
//! writer longer than the in-memory mutation itself.

pub mod model;
pub mod persist;
pub mod reconcile;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::ids::{ChatID, ProjectID, TopicID, UserID, WindowID};

use model::{DroppedBinding, LiveWindow, ReconcileReport, RegistrySnapshot, WindowState};

#[derive(Debug, Default)]
struct Inner {
    /// `(user, topic) -> window`
    bindings: HashMap<(UserID, TopicID), WindowID>,
    window_states: HashMap<WindowID, WindowState>,
    display_names: HashMap<WindowID, String>,
    /// per-(user, window) monitor byte offset, used only for bookkeeping
    /// moved alongside WindowState during reconciliation (the monitor owns
    /// the authoritative copy in `MonitorOffset`).
    user_window_offsets: HashMap<UserID, HashMap<WindowID, i64>>,
    chat_ids: HashMap<(UserID, TopicID), ChatID>,
    project_bindings: HashMap<TopicID, ProjectID>,
}

/// The Binding Registry & Recovery component.
pub struct Registry {
    state_path: PathBuf,
    /// `session_map.json`'s path, needed so reconciliation can delete the
    /// rendezvous entries of windows it drops (spec §4.1 step 2/3).
    session_map_path: PathBuf,
    inner: RwLock<Inner>,
    dirty: AtomicBool,
}

impl Registry {
    pub fn new(state_path: PathBuf, session_map_path: PathBuf) -> Self {
        Self {
            state_path,
            session_map_path,
            inner: RwLock::new(Inner::default()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Load the persisted snapshot at startup. A missing file is not an
    /// error: the registry simply starts empty.
    pub async fn load(&self) -> Result<(), crate::error::TramuntanaError> {
        let snapshot: RegistrySnapshot = persist::load(&self.state_path)?;
        let mut inner = self.inner.write().await;
        for (user, topics) in snapshot.thread_bindings {
            for (topic, window) in topics {
                inner
                    .bindings
                    .insert((UserID(user.clone()), TopicID(topic)), WindowID(window));
            }
        }
        for (window, state) in snapshot.window_states {
            inner.window_states.insert(WindowID(window), state);
        }
        for (window, name) in snapshot.window_display_names {
            inner.display_names.insert(WindowID(window), name);
        }
        for (user, offsets) in snapshot.user_window_offsets {
            let mut m = HashMap::new();
            for (window, offset) in offsets {
                m.insert(WindowID(window), offset);
            }
            inner.user_window_offsets.insert(UserID(user), m);
        }
        for (key, chat_id) in snapshot.group_chat_ids {
            if let Some((user, topic)) = key.split_once(':') {
                inner.chat_ids.insert(
                    (UserID(user.to_string()), TopicID(topic.to_string())),
                    ChatID(chat_id),
                );
            }
        }
        for (topic, project) in snapshot.project_bindings {
            inner
                .project_bindings
                .insert(TopicID(topic), ProjectID(project));
        }
        Ok(())
    }

    /// `Bind(user, topic, window)` — idempotent, overwrites any previous
    /// binding for (user, topic).
    pub async fn bind(&self, user: UserID, topic: TopicID, window: WindowID) {
        let mut inner = self.inner.write().await;
        inner.bindings.insert((user, topic), window);
        drop(inner);
        self.mark_dirty();
    }

    /// `Unbind(user, topic)` — removes the binding only; WindowState is
    /// not touched.
    pub async fn unbind(&self, user: &UserID, topic: &TopicID) {
        let mut inner = self.inner.write().await;
        inner.bindings.remove(&(user.clone(), topic.clone()));
        drop(inner);
        self.mark_dirty();
    }

    pub async fn lookup(&self, user: &UserID, topic: &TopicID) -> Option<WindowID> {
        let inner = self.inner.read().await;
        inner.bindings.get(&(user.clone(), topic.clone())).cloned()
    }

    pub async fn users_for_window(&self, window: &WindowID) -> Vec<(UserID, TopicID)> {
        let inner = self.inner.read().await;
        inner
            .bindings
            .iter()
            .filter(|(_, w)| *w == window)
            .map(|((u, t), _)| (u.clone(), t.clone()))
            .collect()
    }

    pub async fn bound_windows(&self) -> HashSet<WindowID> {
        let inner = self.inner.read().await;
        inner.bindings.values().cloned().collect()
    }

    /// All users currently bound to `topic`, across any window — used by
    /// topic-close teardown (spec §4.6), which only carries a `ChatID` and
    /// `TopicID`, never the user whose message triggered it.
    pub async fn users_for_topic(&self, topic: &TopicID) -> Vec<UserID> {
        let inner = self.inner.read().await;
        inner
            .bindings
            .keys()
            .filter(|(_, t)| t == topic)
            .map(|(u, _)| u.clone())
            .collect()
    }

    pub async fn set_window_state(&self, window: WindowID, state: WindowState) {
        let mut inner = self.inner.write().await;
        inner.window_states.insert(window, state);
        drop(inner);
        self.mark_dirty();
    }

    pub async fn display_name(&self, window: &WindowID) -> Option<String> {
        let inner = self.inner.read().await;
        inner.display_names.get(window).cloned()
    }

    pub async fn set_display_name(&self, window: WindowID, name: String) {
        let mut inner = self.inner.write().await;
        inner.display_names.insert(window, name);
        drop(inner);
        self.mark_dirty();
    }

    pub async fn window_state(&self, window: &WindowID) -> Option<WindowState> {
        let inner = self.inner.read().await;
        inner.window_states.get(window).cloned()
    }

    pub async fn chat_id(&self, user: &UserID, topic: &TopicID) -> Option<ChatID> {
        let inner = self.inner.read().await;
        inner.chat_ids.get(&(user.clone(), topic.clone())).cloned()
    }

    pub async fn set_chat_id(&self, user: UserID, topic: TopicID, chat_id: ChatID) {
        let mut inner = self.inner.write().await;
        inner.chat_ids.insert((user, topic), chat_id);
        drop(inner);
        self.mark_dirty();
    }

    /// `RemoveWindowState(window)` — also removes DisplayName and per-user
    /// byte-offsets for that window.
    pub async fn remove_window_state(&self, window: &WindowID) {
        let mut inner = self.inner.write().await;
        inner.window_states.remove(window);
        inner.display_names.remove(window);
        for offsets in inner.user_window_offsets.values_mut() {
            offsets.remove(window);
        }
        drop(inner);
        self.mark_dirty();
    }

    /// Forget the remembered `ChatID` for a (user, topic) pair, without
    /// touching its binding or project binding (used by the dead-window
    /// path, spec §7 item 5, which removes bindings and chat state but
    /// leaves the user's project choice intact).
    pub async fn remove_chat_id(&self, user: &UserID, topic: &TopicID) {
        let mut inner = self.inner.write().await;
        inner.chat_ids.remove(&(user.clone(), topic.clone()));
        drop(inner);
        self.mark_dirty();
    }

    /// Remove a binding, its chat-id record, and project binding together
    /// (used by topic-close, spec §4.6).
    pub async fn remove_topic(&self, user: &UserID, topic: &TopicID) {
        let mut inner = self.inner.write().await;
        inner.bindings.remove(&(user.clone(), topic.clone()));
        inner.chat_ids.remove(&(user.clone(), topic.clone()));
        inner.project_bindings.remove(topic);
        drop(inner);
        self.mark_dirty();
    }

    pub async fn project_binding(&self, topic: &TopicID) -> Option<ProjectID> {
        let inner = self.inner.read().await;
        inner.project_bindings.get(topic).cloned()
    }

    pub async fn set_project_binding(&self, topic: TopicID, project: ProjectID) {
        let mut inner = self.inner.write().await;
        inner.project_bindings.insert(topic, project);
        drop(inner);
        self.mark_dirty();
    }

    /// Recovery algorithm (spec §4.1). Re-resolves renamed windows by
    /// DisplayName, drops bindings whose window is both dead and
    /// unrenamed, and reports both outcomes for the caller to notify/log.
    pub async fn reconcile(&self, live_windows: &[LiveWindow]) -> ReconcileReport {
        let live_ids: HashSet<WindowID> = live_windows.iter().map(|w| w.id.clone()).collect();
        let names = reconcile::name_to_id(live_windows);

        let mut inner = self.inner.write().await;
        let bound: HashSet<WindowID> = inner.bindings.values().cloned().collect();
        let mut report = ReconcileReport::default();
        let mut dropped_windows: HashSet<WindowID> = HashSet::new();

        for window in bound {
            let display_name = inner.display_names.get(&window).cloned();
            match reconcile::classify(&window, display_name.as_deref(), &live_ids, &names) {
                reconcile::WindowFate::Keep => {}
                reconcile::WindowFate::ReResolve(new_window) => {
                    let affected: Vec<(UserID, TopicID)> = inner
                        .bindings
                        .iter()
                        .filter(|(_, w)| **w == window)
                        .map(|(k, _)| k.clone())
                        .collect();
                    for key in &affected {
                        inner.bindings.insert(key.clone(), new_window.clone());
                    }
                    if let Some(state) = inner.window_states.remove(&window) {
                        inner.window_states.insert(new_window.clone(), state);
                    }
                    if let Some(name) = inner.display_names.remove(&window) {
                        inner.display_names.insert(new_window.clone(), name);
                    }
                    for offsets in inner.user_window_offsets.values_mut() {
                        if let Some(offset) = offsets.remove(&window) {
                            offsets.insert(new_window.clone(), offset);
                        }
                    }
                    info!(from = %window, to = %new_window, "reconciliation re-resolved window");
                    report.re_resolved.push((window.clone(), new_window));
                }
                reconcile::WindowFate::Drop => {
                    let affected: Vec<(UserID, TopicID)> = inner
                        .bindings
                        .iter()
                        .filter(|(_, w)| **w == window)
                        .map(|(k, _)| k.clone())
                        .collect();
                    let cwd = inner.window_states.get(&window).map(|s| s.cwd.clone());
                    for (user, topic) in &affected {
                        let chat_id = inner.chat_ids.get(&(user.clone(), topic.clone())).cloned();
                        inner.bindings.remove(&(user.clone(), topic.clone()));
                        inner.chat_ids.remove(&(user.clone(), topic.clone()));
                        report.dropped.push(DroppedBinding {
                            user: user.clone(),
                            topic: topic.clone(),
                            chat_id,
                            old_window: window.clone(),
                            cwd: cwd.clone(),
                        });
                    }
                    inner.window_states.remove(&window);
                    inner.display_names.remove(&window);
                    for offsets in inner.user_window_offsets.values_mut() {
                        offsets.remove(&window);
                    }
                    dropped_windows.insert(window.clone());
                    warn!(window = %window, "reconciliation dropped dead window");
                }
            }
        }
        drop(inner);
        if !report.is_empty() {
            self.mark_dirty();
        }
        if !dropped_windows.is_empty() {
            match crate::hook::lockfile::remove_dropped_windows(&self.session_map_path, &dropped_windows) {
                Ok(removed) if !removed.is_empty() => {
                    info!(count = removed.len(), "reconciliation pruned rendezvous entries for dropped windows");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "failed to prune session_map.json for dropped windows"),
            }
        }
        report
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Atomic write of the full registry, matching spec §4.1 `Persist()`.
    /// Failure is logged, not propagated fatally: the dirty flag is left
    /// set so the next periodic flush retries.
    pub async fn persist(&self) {
        let snapshot = self.snapshot().await;
        match persist::save(&self.state_path, &snapshot) {
            Ok(()) => self.dirty.store(false, Ordering::SeqCst),
            Err(e) => warn!(error = %e, "registry persist failed, will retry"),
        }
    }

    async fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read().await;
        let mut thread_bindings: HashMap<String, HashMap<String, String>> = HashMap::new();
        for ((user, topic), window) in &inner.bindings {
            thread_bindings
                .entry(user.0.clone())
                .or_default()
                .insert(topic.0.clone(), window.0.clone());
        }
        let window_states = inner
            .window_states
            .iter()
            .map(|(w, s)| (w.0.clone(), s.clone()))
            .collect();
        let window_display_names = inner
            .display_names
            .iter()
            .map(|(w, n)| (w.0.clone(), n.clone()))
            .collect();
        let mut user_window_offsets: HashMap<String, HashMap<String, i64>> = HashMap::new();
        for (user, offsets) in &inner.user_window_offsets {
            let m = offsets.iter().map(|(w, o)| (w.0.clone(), *o)).collect();
            user_window_offsets.insert(user.0.clone(), m);
        }
        let group_chat_ids = inner
            .chat_ids
            .iter()
            .map(|((u, t), c)| (format!("{}:{}", u.0, t.0), c.0))
            .collect();
        let project_bindings = inner
            .project_bindings
            .iter()
            .map(|(t, p)| (t.0.clone(), p.0.clone()))
            .collect();

        RegistrySnapshot {
            thread_bindings,
            window_states,
            window_display_names,
            user_window_offsets,
            group_chat_ids,
            project_bindings,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
