// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat Intake (spec §4.6): long-poll for updates, parse each into an
//! [`event::IntakeEvent`], and hand it to the [`router::Router`]. The
//! `tokio::select! { biased; ... }` shutdown-over-poll shape is the one
//! inbound-routing example in the retrieval pack outside the teacher
//! (an `InboundRouterCtx`-style run loop), generalized from a generic
//! message router to this chat-specific one.

pub mod bash_mode;
pub mod catalog;
pub mod chat_source;
pub mod event;
pub mod picker;
pub mod router;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::mux_client::Multiplexer;

use chat_source::ChatSource;
use router::Router;

#[derive(Debug, Default, Serialize, Deserialize)]
struct OffsetState {
    #[serde(default)]
    offset: i64,
}

pub struct Intake<M: Multiplexer> {
    source: Arc<dyn ChatSource>,
    router: Arc<Router<M>>,
    offset_path: PathBuf,
}

impl<M: Multiplexer + 'static> Intake<M> {
    pub fn new(source: Arc<dyn ChatSource>, router: Arc<Router<M>>, offset_path: PathBuf) -> Self {
        Self { source, router, offset_path }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        let mut offset = crate::registry::persist::load::<OffsetState>(&self.offset_path)
            .map(|s| s.offset)
            .unwrap_or(0);

        loop {
            let poll = self.source.poll_updates(offset);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("chat intake shutting down");
                    break;
                }
                result = poll => {
                    offset = self.handle_poll_result(result, offset).await;
                }
            }
        }
    }

    async fn handle_poll_result(
        &self,
        result: Result<(Vec<serde_json::Value>, i64), crate::error::TramuntanaError>,
        offset: i64,
    ) -> i64 {
        let (updates, next_offset) = match result {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "chat intake poll failed");
                return offset;
            }
        };

        for raw in &updates {
            if let Some(event) = event::parse_update(raw) {
                self.router.dispatch(event).await;
            }
        }

        if next_offset != offset {
            if let Err(e) = crate::registry::persist::save(&self.offset_path, &OffsetState { offset: next_offset }) {
                warn!(error = %e, "failed to persist chat intake offset");
            }
        }
        next_offset
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
