// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The multiplexer interface consumed by the daemon (spec §6), and a
//! shell-exec implementation against a real tmux server — grounded on
//! `pty::attach::TmuxBackend`'s `tmux_async_cmd` pattern, generalized
//! from one attached session to arbitrary session/window addressing.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{classify_mux_error, TramuntanaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    Escape,
    Up,
    Down,
    Left,
    Right,
    Space,
    Tab,
    Enter,
}

impl SpecialKey {
    fn as_tmux_arg(self) -> &'static str {
        match self {
            SpecialKey::Escape => "Escape",
            SpecialKey::Up => "Up",
            SpecialKey::Down => "Down",
            SpecialKey::Left => "Left",
            SpecialKey::Right => "Right",
            SpecialKey::Space => "Space",
            SpecialKey::Tab => "Tab",
            SpecialKey::Enter => "Enter",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub id: String,
    pub name: String,
    pub cwd: String,
}

/// The abstract multiplexer capability the rest of the daemon depends
/// on. Window addressing uses `session:windowID` targets throughout, so
/// callers never need to know tmux's own pane syntax.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    async fn session_exists(&self, session: &str) -> Result<bool, TramuntanaError>;
    async fn ensure_session(&self, session: &str) -> Result<(), TramuntanaError>;
    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, TramuntanaError>;
    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &str,
        cmd: &str,
    ) -> Result<String, TramuntanaError>;
    async fn send_keys(&self, session: &str, window_id: &str, text: &str) -> Result<(), TramuntanaError>;
    async fn send_enter(&self, session: &str, window_id: &str) -> Result<(), TramuntanaError>;
    async fn send_keys_with_delay(
        &self,
        session: &str,
        window_id: &str,
        text: &str,
        delay_ms: u64,
    ) -> Result<(), TramuntanaError>;
    async fn send_special_key(
        &self,
        session: &str,
        window_id: &str,
        key: SpecialKey,
    ) -> Result<(), TramuntanaError>;
    async fn capture_pane(&self, session: &str, window_id: &str) -> Result<String, TramuntanaError>;
    async fn kill_window(&self, session: &str, window_id: &str) -> Result<(), TramuntanaError>;
    async fn display_message(&self, session: &str, window_id: &str, format: &str) -> Result<String, TramuntanaError>;
}

/// Returns true if an error returned by [`Multiplexer`] indicates the
/// target window no longer exists — the dead-window path of spec §4.1.
pub fn is_window_dead(err: &TramuntanaError) -> bool {
    err.category == crate::error::ErrorCategory::DeadWindow
}

/// Resolves `sessionName:windowID:windowName` for a multiplexer pane id,
/// the one query the Session Hook needs (spec §4.2). Kept separate from
/// [`Multiplexer`] because the hook addresses a pane directly, before it
/// knows the `session:windowID` target the rest of the daemon uses.
#[async_trait]
pub trait SessionIdentityResolver: Send + Sync {
    async fn resolve(&self, pane_id: &str) -> Result<String, TramuntanaError>;
}

#[async_trait]
impl SessionIdentityResolver for TmuxClient {
    async fn resolve(&self, pane_id: &str) -> Result<String, TramuntanaError> {
        self.run(&[
            "display-message",
            "-p",
            "-t",
            pane_id,
            "#{session_name}:#{window_id}:#{window_name}",
        ])
        .await
        .map(|s| s.trim().to_string())
    }
}

/// A real `Multiplexer` backed by shell-exec `tmux` invocations.
pub struct TmuxClient {
    socket: Option<PathBuf>,
}

impl TmuxClient {
    pub fn new(socket: Option<PathBuf>) -> Self {
        Self { socket }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new("tmux");
        if let Some(s) = &self.socket {
            cmd.arg("-S").arg(s);
        }
        cmd
    }

    fn target(session: &str, window_id: &str) -> String {
        format!("{session}:{window_id}")
    }

    async fn run(&self, args: &[&str]) -> Result<String, TramuntanaError> {
        let output = self
            .cmd()
            .args(args)
            .output()
            .await
            .map_err(|e| TramuntanaError::new(crate::error::ErrorCategory::Filesystem, e.to_string()))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let detail = String::from_utf8_lossy(&output.stderr).into_owned();
            let category = classify_mux_error(&detail);
            Err(TramuntanaError::new(category, detail))
        }
    }
}

#[async_trait]
impl Multiplexer for TmuxClient {
    async fn session_exists(&self, session: &str) -> Result<bool, TramuntanaError> {
        match self.run(&["has-session", "-t", session]).await {
            Ok(_) => Ok(true),
            Err(e) if e.category == crate::error::ErrorCategory::DeadWindow => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn ensure_session(&self, session: &str) -> Result<(), TramuntanaError> {
        if self.session_exists(session).await? {
            return Ok(());
        }
        self.run(&["new-session", "-d", "-s", session]).await.map(|_| ())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, TramuntanaError> {
        let format = "#{window_id}\t#{window_name}\t#{pane_current_path}";
        let out = self
            .run(&["list-windows", "-t", session, "-F", format])
            .await?;
        Ok(out
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '\t');
                let id = parts.next()?.to_string();
                let name = parts.next()?.to_string();
                let cwd = parts.next().unwrap_or_default().to_string();
                Some(WindowInfo { id, name, cwd })
            })
            .collect())
    }

    async fn new_window(
        &self,
        session: &str,
        name: &str,
        cwd: &str,
        cmd: &str,
    ) -> Result<String, TramuntanaError> {
        let out = self
            .run(&[
                "new-window",
                "-P",
                "-F",
                "#{window_id}",
                "-t",
                session,
                "-n",
                name,
                "-c",
                cwd,
                cmd,
            ])
            .await?;
        Ok(out.trim().to_string())
    }

    async fn send_keys(&self, session: &str, window_id: &str, text: &str) -> Result<(), TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["send-keys", "-l", "-t", &target, text]).await.map(|_| ())
    }

    async fn send_enter(&self, session: &str, window_id: &str) -> Result<(), TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["send-keys", "-t", &target, "Enter"]).await.map(|_| ())
    }

    async fn send_keys_with_delay(
        &self,
        session: &str,
        window_id: &str,
        text: &str,
        delay_ms: u64,
    ) -> Result<(), TramuntanaError> {
        self.send_keys(session, window_id, text).await?;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        self.send_enter(session, window_id).await
    }

    async fn send_special_key(
        &self,
        session: &str,
        window_id: &str,
        key: SpecialKey,
    ) -> Result<(), TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["send-keys", "-t", &target, key.as_tmux_arg()])
            .await
            .map(|_| ())
    }

    async fn capture_pane(&self, session: &str, window_id: &str) -> Result<String, TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["capture-pane", "-p", "-t", &target]).await
    }

    async fn kill_window(&self, session: &str, window_id: &str) -> Result<(), TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["kill-window", "-t", &target]).await.map(|_| ())
    }

    async fn display_message(&self, session: &str, window_id: &str, format: &str) -> Result<String, TramuntanaError> {
        let target = Self::target(session, window_id);
        self.run(&["display-message", "-p", "-t", &target, format]).await
    }
}

#[cfg(test)]
#[path = "mux_client_tests.rs"]
mod tests;
