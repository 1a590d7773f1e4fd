// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ChatID, SessionID, TopicID, UserID, WindowID};

/// `WindowID → { SessionID, CWD, DisplayName }`. `display_name` is stored
/// alongside the session/cwd pair rather than in a separate map so that a
/// single persisted document describes everything a window needs; the
/// on-disk layout still keeps a parallel `window_display_names` map for
/// format compatibility with spec §6, reconstructed on load/save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub session_id: Option<SessionID>,
    pub cwd: String,
}

/// The full Binding Registry snapshot, matching the on-disk `state.json`
/// shape from spec §6 field for field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub thread_bindings: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub window_states: HashMap<String, WindowState>,
    #[serde(default)]
    pub window_display_names: HashMap<String, String>,
    #[serde(default)]
    pub user_window_offsets: HashMap<String, HashMap<String, i64>>,
    #[serde(default)]
    pub group_chat_ids: HashMap<String, i64>,
    #[serde(default)]
    pub project_bindings: HashMap<String, String>,
}

/// A live window reported by the multiplexer, as consumed by `Reconcile`.
#[derive(Debug, Clone)]
pub struct LiveWindow {
    pub id: WindowID,
    pub name: String,
    pub cwd: String,
}

/// One `(user, topic)` pair unbound as a side effect of reconciliation, for
/// the caller to notify ("session died") per spec §7 category 5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedBinding {
    pub user: UserID,
    pub topic: TopicID,
    pub chat_id: Option<ChatID>,
    pub old_window: WindowID,
    pub cwd: Option<String>,
}

/// Outcome of one `Reconcile` pass, reported to the caller for logging and
/// (for drops) user notification.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub re_resolved: Vec<(WindowID, WindowID)>,
    pub dropped: Vec<DroppedBinding>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.re_resolved.is_empty() && self.dropped.is_empty()
    }
}
