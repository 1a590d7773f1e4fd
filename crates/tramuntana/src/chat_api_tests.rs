// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn rich_parse_mode_maps_to_markdown_v2() {
    assert_eq!(parse_mode_str(ParseMode::Rich), Some("MarkdownV2"));
}

#[test]
fn plain_parse_mode_is_omitted() {
    assert_eq!(parse_mode_str(ParseMode::Plain), None);
}

#[test]
fn general_topic_is_not_sent_as_a_thread_id() {
    assert_eq!(topic_field(&TopicID::from("0")), None);
}

#[test]
fn non_general_topic_parses_to_its_thread_id() {
    assert_eq!(topic_field(&TopicID::from("42")), Some(42));
}

#[test]
fn non_numeric_topic_has_no_thread_id() {
    assert_eq!(topic_field(&TopicID::from("general")), None);
}

#[test]
fn base_url_embeds_the_token_once() {
    let client = BotApiClient::new("https://api.example.com/", "secret-token");
    assert_eq!(client.url("getUpdates"), "https://api.example.com/botsecret-token/getUpdates");
}

#[test]
fn api_response_decodes_error_description() {
    let raw = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
    let parsed: ApiResponse = serde_json::from_str(raw).expect("valid json");
    assert!(!parsed.ok);
    assert_eq!(parsed.description.as_deref(), Some("Bad Request: chat not found"));
}
