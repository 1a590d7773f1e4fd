// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;

#[test]
fn parses_plain_text_message_in_a_topic() {
    let raw = json!({
        "message": {
            "chat": {"id": -100123},
            "message_thread_id": 42,
            "from": {"id": 100},
            "text": "hello agent"
        }
    });
    let event = parse_update(&raw).expect("event");
    assert_eq!(
        event,
        IntakeEvent::Text {
            user: UserID::from("100"),
            chat_id: ChatID(-100123),
            topic: TopicID::from("42"),
            text: "hello agent".to_string(),
        }
    );
}

#[test]
fn parses_slash_command_with_arguments() {
    let raw = json!({
        "message": {
            "chat": {"id": -100123},
            "message_thread_id": 42,
            "from": {"id": 100},
            "text": "/new my-project"
        }
    });
    let event = parse_update(&raw).expect("event");
    assert_eq!(
        event,
        IntakeEvent::Command {
            user: UserID::from("100"),
            chat_id: ChatID(-100123),
            topic: TopicID::from("42"),
            name: "new".to_string(),
            args: "my-project".to_string(),
        }
    );
}

#[test]
fn message_without_thread_id_defaults_to_general_topic() {
    let raw = json!({
        "message": {
            "chat": {"id": -100123},
            "from": {"id": 100},
            "text": "hi"
        }
    });
    let event = parse_update(&raw).expect("event");
    match event {
        IntakeEvent::Text { topic, .. } => assert_eq!(topic, TopicID::from("0")),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn forum_topic_closed_service_message_is_recognized() {
    let raw = json!({
        "message": {
            "chat": {"id": -100123},
            "message_thread_id": 42,
            "forum_topic_closed": {}
        }
    });
    let event = parse_update(&raw).expect("event");
    assert_eq!(
        event,
        IntakeEvent::TopicClosed {
            chat_id: ChatID(-100123),
            topic: TopicID::from("42"),
        }
    );
}

#[test]
fn parses_callback_query() {
    let raw = json!({
        "callback_query": {
            "from": {"id": 100},
            "data": "nav:up",
            "message": {
                "chat": {"id": -100123},
                "message_thread_id": 42
            }
        }
    });
    let event = parse_update(&raw).expect("event");
    assert_eq!(
        event,
        IntakeEvent::Callback {
            user: UserID::from("100"),
            chat_id: ChatID(-100123),
            topic: TopicID::from("42"),
            data: "nav:up".to_string(),
        }
    );
}

#[test]
fn unrecognized_update_kind_is_none() {
    let raw = json!({"edited_message": {"text": "oops"}});
    assert!(parse_update(&raw).is_none());
}
