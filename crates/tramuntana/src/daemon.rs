// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level daemon wiring — shared by `main` and integration tests.
//! Grounded on `run::prepare`/`run::run`'s shape: one `CancellationToken`,
//! one `tokio::spawn` per cooperating loop, a double-signal SIGTERM/SIGINT
//! handler, generalized from one session's backend+transport set to the
//! bridge's four loops (Chat Intake, Session Monitor, Status Poller,
//! Delivery).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::chat_api::BotApiClient;
use crate::config::Config;
use crate::delivery::DeliveryQueue;
use crate::ids::UserID;
use crate::intake::catalog::JsonProjectCatalog;
use crate::intake::picker::PickerState;
use crate::intake::router::Router;
use crate::intake::{bash_mode::BashModeTracker, Intake};
use crate::monitor::turn::TurnTracker;
use crate::monitor::SessionMonitor;
use crate::mux_client::{Multiplexer, TmuxClient};
use crate::poller::StatusPoller;
use crate::registry::model::LiveWindow;
use crate::registry::Registry;

/// How often the registry's dirty state is flushed to disk, independent
/// of the status poller's own tick rate.
const REGISTRY_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// Initialize tracing/logging from config. Uses `try_init` so it's safe
/// to call more than once (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Run the bridge daemon to completion (i.e. until cancelled by a
/// shutdown signal). Returns once every spawned loop has observed
/// cancellation.
pub async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config);
    config.validate()?;

    let shutdown = CancellationToken::new();
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let mux = Arc::new(TmuxClient::new(None));
    mux.ensure_session(&config.mux_session_name).await?;

    let registry = Arc::new(Registry::new(config.state_path(), config.session_map_path()));
    registry.load().await?;

    let live_windows: Vec<LiveWindow> = mux
        .list_windows(&config.mux_session_name)
        .await?
        .into_iter()
        .map(|w| LiveWindow { id: w.id.into(), name: w.name, cwd: w.cwd })
        .collect();
    let report = registry.reconcile(&live_windows).await;
    if !report.is_empty() {
        info!(
            re_resolved = report.re_resolved.len(),
            dropped = report.dropped.len(),
            "startup reconciliation"
        );
    }

    let chat = Arc::new(BotApiClient::new(&config.chat_api_base_url, &config.chat_token));
    if let Err(e) = chat.set_command_menu().await {
        error!(error = %e, "failed to register command menu, continuing without it");
    }
    let delivery = Arc::new(DeliveryQueue::new(chat.clone(), shutdown.clone()));
    let turns = Arc::new(TurnTracker::new());

    let monitor = Arc::new(SessionMonitor::new(
        registry.clone(),
        delivery.clone(),
        turns.clone(),
        config.session_map_path(),
        config.monitor_state_path(),
        data_dir.clone(),
        Duration::from_secs_f64(config.monitor_poll_interval),
    ));
    monitor.load().await?;

    let poller = Arc::new(Mutex::new(StatusPoller::new(
        mux.clone(),
        registry.clone(),
        delivery.clone(),
        turns.clone(),
        config.mux_session_name.clone(),
        config.agent_command.clone(),
        config.session_map_path(),
        crate::poller::DEFAULT_POLL_INTERVAL,
    )));

    let catalog = Arc::new(JsonProjectCatalog::new(data_dir.join("projects.json")));
    let allowed_users: HashSet<UserID> = config
        .allowed_users
        .iter()
        .filter(|u| !u.trim().is_empty())
        .map(|u| UserID::from(u.as_str()))
        .collect();

    let router = Arc::new(Router::new(
        mux.clone(),
        registry.clone(),
        delivery.clone(),
        poller.clone(),
        catalog,
        Arc::new(PickerState::new()),
        Arc::new(BashModeTracker::new()),
        config.mux_session_name.clone(),
        config.agent_command.clone(),
        allowed_users,
    ));
    let intake = Intake::new(chat, router, data_dir.join("chat_offset.json"));

    // Session Monitor loop.
    {
        let sd = shutdown.clone();
        let monitor = monitor.clone();
        tokio::spawn(async move {
            monitor.run(sd).await;
        });
    }

    // Status Poller loop.
    {
        let sd = shutdown.clone();
        let poller = poller.clone();
        tokio::spawn(async move {
            poller.lock().await.run(sd).await;
        });
    }

    // Chat Intake loop.
    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            intake.run(sd).await;
        });
    }

    // Periodic registry flush — Delivery and the Session Monitor persist
    // their own state on their own schedules; the registry only marks
    // itself dirty on mutation, so something has to flush it on a timer.
    {
        let sd = shutdown.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REGISTRY_FLUSH_INTERVAL);
            loop {
                tokio::select! {
                    _ = sd.cancelled() => break,
                    _ = interval.tick() => {
                        if registry.is_dirty() {
                            registry.persist().await;
                        }
                    }
                }
            }
        });
    }

    spawn_signal_handler(shutdown.clone());

    shutdown.cancelled().await;
    info!("shutting down, flushing state");
    registry.persist().await;
    monitor.persist().await;
    Ok(())
}

/// First SIGTERM/SIGINT triggers graceful shutdown via `cancel()`; a
/// second forces immediate exit, in case a stuck loop never observes
/// the token.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGTERM"),
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => info!("received SIGINT"),
        }
        cancel.cancel();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => error!("received SIGTERM again, forcing exit"),
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => error!("received SIGINT again, forcing exit"),
        }
        std::process::exit(130);
    });
}
