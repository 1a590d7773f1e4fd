// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;

use super::*;

struct FakeResolver {
    identity: &'static str,
}

#[async_trait]
impl SessionIdentityResolver for FakeResolver {
    async fn resolve(&self, _pane_id: &str) -> Result<String, TramuntanaError> {
        Ok(self.identity.to_string())
    }
}

fn valid_input() -> HookInput {
    HookInput {
        session_id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string(),
        cwd: "/home/user/project".to_string(),
        hook_event_name: "SessionStart".to_string(),
    }
}

#[tokio::test]
async fn non_session_start_event_is_noop() {
    let resolver = FakeResolver { identity: "tramuntana:@1:agent" };
    let mut input = valid_input();
    input.hook_event_name = "PostToolUse".to_string();

    let outcome = run(&resolver, input, Some("%0".to_string()), PathBuf::from("/unused")).await.expect("run");
    assert_eq!(outcome, HookOutcome::NotSessionStart);
}

#[tokio::test]
async fn missing_pane_env_is_noop() {
    let resolver = FakeResolver { identity: "tramuntana:@1:agent" };
    let outcome = run(&resolver, valid_input(), None, PathBuf::from("/unused")).await.expect("run");
    assert_eq!(outcome, HookOutcome::NotInMultiplexer);
}

#[tokio::test]
async fn invalid_session_id_is_rejected() {
    let resolver = FakeResolver { identity: "tramuntana:@1:agent" };
    let mut input = valid_input();
    input.session_id = "not-a-uuid".to_string();

    let err = run(&resolver, input, Some("%0".to_string()), PathBuf::from("/unused"))
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Configuration);
}

#[tokio::test]
async fn relative_cwd_is_rejected() {
    let resolver = FakeResolver { identity: "tramuntana:@1:agent" };
    let mut input = valid_input();
    input.cwd = "relative/path".to_string();

    let err = run(&resolver, input, Some("%0".to_string()), PathBuf::from("/unused"))
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Configuration);
}

#[tokio::test]
async fn successful_run_records_session_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let resolver = FakeResolver { identity: "tramuntana:@7:agent-main" };

    let outcome = run(&resolver, valid_input(), Some("%3".to_string()), tmp.path().to_path_buf())
        .await
        .expect("run");
    assert_eq!(outcome, HookOutcome::Recorded(SessionKey("tramuntana:@7".to_string())));

    let map: crate::monitor::model::SessionMap =
        crate::registry::persist::load(&tmp.path().join("session_map.json")).expect("load");
    let entry = map.get("tramuntana:@7").expect("entry present");
    assert_eq!(entry.session_id, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    assert_eq!(entry.cwd, "/home/user/project");
    assert_eq!(entry.window_name, "agent-main");
}

#[tokio::test]
async fn unparseable_identity_is_a_parse_error() {
    let resolver = FakeResolver { identity: "garbage" };
    let err = run(&resolver, valid_input(), Some("%0".to_string()), PathBuf::from("/unused"))
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ParseError);
}
