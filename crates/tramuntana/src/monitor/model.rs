// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk shapes for `monitor_state.json` and `session_map.json`
//! (spec §6 "On-disk formats").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorOffsetEntry {
    pub session_id: String,
    pub file_path: String,
    pub last_byte_offset: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorState {
    pub tracked_sessions: HashMap<String, MonitorOffsetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMapEntry {
    pub session_id: String,
    pub cwd: String,
    pub window_name: String,
}

pub type SessionMap = HashMap<String, SessionMapEntry>;
