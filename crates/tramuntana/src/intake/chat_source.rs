// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The long-poll capability intake consumes (spec §6): "long-poll
//! `getUpdates(offset, timeout, allowed=[message, callback_query])`
//! returning raw JSON plus typed values." The HTTP/long-poll mechanics
//! themselves are an out-of-scope external collaborator (spec §1); this
//! trait is the seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TramuntanaError;

#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Long-poll for updates after `offset`. Returns the raw update
    /// values and the offset to pass on the next call.
    async fn poll_updates(&self, offset: i64) -> Result<(Vec<Value>, i64), TramuntanaError>;
}
