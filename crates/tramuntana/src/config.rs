// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Bridge daemon configuration, sourced from environment variables (or an
/// optional dotenv-style `--config` file loaded before parsing).
#[derive(Debug, Parser)]
#[command(name = "tramuntana", version, about)]
pub struct Config {
    /// Bearer token for the chat layer.
    #[arg(long, env = "CHAT_TOKEN")]
    pub chat_token: String,

    /// Base URL of the chat layer's HTTP API.
    #[arg(long, env = "CHAT_API_BASE_URL", default_value = "https://api.telegram.org")]
    pub chat_api_base_url: String,

    /// Comma-separated user ids allowed to drive the bridge.
    #[arg(long, env = "ALLOWED_USERS", value_delimiter = ',')]
    pub allowed_users: Vec<String>,

    /// Comma-separated group ids allowed to drive the bridge (empty = any).
    #[arg(long, env = "ALLOWED_GROUPS", value_delimiter = ',', default_value = "")]
    pub allowed_groups: Vec<String>,

    /// Home for state.json, monitor_state.json, session_map.json.
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Multiplexer session to own.
    #[arg(long, env = "MUX_SESSION_NAME", default_value = "tramuntana")]
    pub mux_session_name: String,

    /// Command launched in a new window.
    #[arg(long, env = "AGENT_COMMAND", default_value = "claude")]
    pub agent_command: String,

    /// Monitor poll interval, seconds.
    #[arg(long, env = "MONITOR_POLL_INTERVAL", default_value = "2.0")]
    pub monitor_poll_interval: f64,

    /// Log format (json or text).
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Load environment defaults from a dotenv-style file before parsing.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Validate the configuration after parsing. Configuration errors are
    /// fatal at startup (spec §7 category 1).
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chat_token.trim().is_empty() {
            anyhow::bail!("CHAT_TOKEN must not be empty");
        }
        if self.allowed_users.iter().all(|u| u.trim().is_empty()) {
            anyhow::bail!("ALLOWED_USERS must contain at least one user id");
        }
        if self.monitor_poll_interval <= 0.0 {
            anyhow::bail!("MONITOR_POLL_INTERVAL must be positive");
        }
        if self.mux_session_name.trim().is_empty() {
            anyhow::bail!("MUX_SESSION_NAME must not be empty");
        }
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid LOG_FORMAT: {other}"),
        }
        Ok(())
    }

    /// Resolve the data directory, defaulting to `~/.tramuntana`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            let home = std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            home.join(".tramuntana")
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir().join("state.json")
    }

    pub fn monitor_state_path(&self) -> PathBuf {
        self.data_dir().join("monitor_state.json")
    }

    pub fn session_map_path(&self) -> PathBuf {
        self.data_dir().join("session_map.json")
    }

    /// Load `KEY=VALUE` lines from a dotenv-style file as process defaults,
    /// without overriding variables already set in the environment.
    pub fn apply_config_file(path: &std::path::Path) -> anyhow::Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config file {}: {e}", path.display()))?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if std::env::var_os(key).is_none() {
                    // SAFETY: single-threaded startup, before any loop runs.
                    std::env::set_var(key, value.trim());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
