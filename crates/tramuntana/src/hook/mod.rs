// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Session Hook (spec §4.2): a one-shot binary invoked inside the
//! agent's session-start lifecycle. Reads a JSON document from stdin,
//! resolves the current multiplexer pane's `session:window` identity,
//! and records a rendezvous entry under an advisory lock so the daemon
//! can find the new session's transcript.

pub mod install;
pub mod lockfile;
pub mod model;

use std::path::PathBuf;

use crate::error::{ErrorCategory, TramuntanaError};
use crate::ids::SessionKey;
use crate::monitor::model::SessionMapEntry;
use crate::mux_client::SessionIdentityResolver;

use model::HookInput;

/// Environment variable naming the multiplexer's pane for the current
/// child process (set by tmux itself, not by the daemon).
pub const PANE_ENV_VAR: &str = "TMUX_PANE";

/// Environment variable naming the rendezvous directory, shared with the
/// daemon's own `DATA_DIR` (spec §6).
pub const DATA_DIR_ENV_VAR: &str = "DATA_DIR";

const SESSION_START_EVENT: &str = "SessionStart";

/// What happened on one hook invocation — the dispositions `main` maps
/// to process exit codes.
#[derive(Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// `hook_event_name` was not `SessionStart`; nothing was done.
    NotSessionStart,
    /// No multiplexer pane-id in the environment; nothing was done.
    NotInMultiplexer,
    /// A rendezvous entry was written under `SessionKey`.
    Recorded(SessionKey),
}

/// Validate `session_id` as a UUID and `cwd` as an absolute path.
pub fn validate(input: &HookInput) -> Result<(), TramuntanaError> {
    uuid::Uuid::parse_str(&input.session_id)
        .map_err(|_| TramuntanaError::new(ErrorCategory::Configuration, format!("invalid session_id: {}", input.session_id)))?;
    if !std::path::Path::new(&input.cwd).is_absolute() {
        return Err(TramuntanaError::new(
            ErrorCategory::Configuration,
            format!("cwd must be absolute: {}", input.cwd),
        ));
    }
    Ok(())
}

/// Resolve the rendezvous directory: `DATA_DIR` if set, else
/// `~/.tramuntana` (mirrors `Config::data_dir`).
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".tramuntana")
}

/// Resolve the rendezvous directory the same way `run` expects it: the
/// `DATA_DIR` environment variable if set, else [`default_data_dir`].
pub fn resolve_data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV_VAR).map(PathBuf::from).unwrap_or_else(default_data_dir)
}

/// Run the hook against an already-parsed [`HookInput`], given a resolver
/// for the current pane's `session:window:windowName` identity, the
/// multiplexer's pane-id environment variable (absent ⇒ not running
/// inside the multiplexer), and the rendezvous directory to write into.
pub async fn run(
    resolver: &dyn SessionIdentityResolver,
    input: HookInput,
    pane_id: Option<String>,
    data_dir: PathBuf,
) -> Result<HookOutcome, TramuntanaError> {
    if input.hook_event_name != SESSION_START_EVENT {
        return Ok(HookOutcome::NotSessionStart);
    }
    validate(&input)?;

    let Some(pane_id) = pane_id else {
        return Ok(HookOutcome::NotInMultiplexer);
    };

    let identity = resolver.resolve(&pane_id).await?;
    let (session_name, window_id, window_name) = split_identity(&identity)?;
    let session_key = SessionKey::new(session_name, &crate::ids::WindowID::from(window_id));

    std::fs::create_dir_all(&data_dir)
        .map_err(|e| TramuntanaError::new(ErrorCategory::Filesystem, format!("{}: {e}", data_dir.display())))?;
    let session_map_path = data_dir.join("session_map.json");

    lockfile::record_session(
        &session_map_path,
        session_key.as_str().to_string(),
        SessionMapEntry {
            session_id: input.session_id,
            cwd: input.cwd,
            window_name: window_name.to_string(),
        },
    )?;

    Ok(HookOutcome::Recorded(session_key))
}

/// Split `sessionName:windowID:windowName` into its three parts.
fn split_identity(identity: &str) -> Result<(&str, &str, &str), TramuntanaError> {
    let mut parts = identity.splitn(3, ':');
    let session = parts.next().filter(|s| !s.is_empty());
    let window = parts.next().filter(|s| !s.is_empty());
    let name = parts.next().unwrap_or_default();
    match (session, window) {
        (Some(session), Some(window)) => Ok((session, window, name)),
        _ => Err(TramuntanaError::new(
            ErrorCategory::ParseError,
            format!("unparseable pane identity: {identity:?}"),
        )),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
