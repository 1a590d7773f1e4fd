// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifier newtypes shared across the registry, monitor, and
//! delivery subsystems. All are thin wrappers over `String` (or `i64` for
//! `ChatID`) so that accidental mixing (e.g. passing a `WindowID` where a
//! `TopicID` is expected) is caught at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(UserID);
string_id!(TopicID);
string_id!(WindowID);
string_id!(SessionID);
string_id!(ProjectID);

/// Signed chat identifier (matches the chat layer's own numeric id space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatID(pub i64);

impl fmt::Display for ChatID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `sessionName + ":" + WindowID`, the primary key of the rendezvous file
/// and the monitor offset map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(mux_session_name: &str, window: &WindowID) -> Self {
        Self(format!("{mux_session_name}:{}", window.0))
    }

    /// The windowID suffix (everything after the last `:`) is the canonical
    /// way to map an entry back to a multiplexer window.
    pub fn window_id(&self) -> WindowID {
        match self.0.rsplit_once(':') {
            Some((_, suffix)) => WindowID(suffix.to_string()),
            None => WindowID(self.0.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `(UserID, TopicID)` pair, the unit a Binding is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserTopic {
    pub user: UserID,
    pub topic: TopicID,
}

impl UserTopic {
    pub fn new(user: UserID, topic: TopicID) -> Self {
        Self { user, topic }
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
