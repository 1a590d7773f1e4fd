// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The minimal `ChatClient` capability the Delivery queue is injected
//! with at wiring time (spec §9 "Cyclic references"). Breaking the
//! Bot↔DeliveryQueue cycle this way means Delivery never holds a
//! reference back to the intake loop, only this narrow interface.

use async_trait::async_trait;

use crate::error::TramuntanaError;
use crate::ids::{ChatID, TopicID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Rich,
    Plain,
}

/// Opaque message id returned by `send`, used for later `edit`/`delete`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatMessageID(pub String);

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatID,
        topic_id: &TopicID,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<ChatMessageID, TramuntanaError>;

    async fn edit(
        &self,
        chat_id: ChatID,
        message_id: &ChatMessageID,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), TramuntanaError>;

    async fn delete(&self, chat_id: ChatID, message_id: &ChatMessageID)
        -> Result<(), TramuntanaError>;

    async fn send_typing(&self, chat_id: ChatID) -> Result<(), TramuntanaError>;
}
