use anthropic_api::headers::{
    build_headers, HEADER_ACCEPT, HEADER_ANTHROPIC_BETA, HEADER_ANTHROPIC_VERSION, HEADER_API_KEY,
    HEADER_CONTENT_TYPE, HEADER_USER_AGENT,
};
use anthropic_api::{AnthropicApiConfig, AnthropicApiError};

#[test]
fn header_map_contains_messages_headers() {
    let config = AnthropicApiConfig::new(" key-123 ").insert_header("X-Extra", "value");

    let headers = build_headers(&config, &[], true).expect("header construction");
    assert_eq!(
        headers.get(HEADER_API_KEY).expect("api key"),
        &"key-123".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_ANTHROPIC_VERSION).expect("version"),
        &"2023-06-01".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        &"text/event-stream".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).expect("content-type"),
        &"application/json".to_owned()
    );
    assert_eq!(headers.get("x-extra").expect("custom"), &"value".to_owned());
    assert!(headers.get(HEADER_ANTHROPIC_BETA).is_none());
    assert!(headers
        .get(HEADER_USER_AGENT)
        .expect("user-agent")
        .starts_with("anthropic_api/"));
}

#[test]
fn betas_join_into_one_header_and_skip_blanks() {
    let config = AnthropicApiConfig::new("key");
    let betas = vec![
        "context-1m-2025-08-07".to_owned(),
        " ".to_owned(),
        "other-beta".to_owned(),
    ];

    let headers = build_headers(&config, &betas, false).expect("header construction");
    assert_eq!(
        headers.get(HEADER_ANTHROPIC_BETA).expect("beta"),
        &"context-1m-2025-08-07,other-beta".to_owned()
    );
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        &"application/json".to_owned()
    );
}

#[test]
fn missing_api_key_is_rejected() {
    let result = build_headers(&AnthropicApiConfig::new("  "), &[], false);
    assert!(matches!(result, Err(AnthropicApiError::MissingApiKey)));
}

#[test]
fn explicit_user_agent_wins() {
    let config = AnthropicApiConfig::new("key").with_user_agent("test-agent");
    let headers = build_headers(&config, &[], false).expect("header construction");
    assert_eq!(
        headers.get(HEADER_USER_AGENT).expect("user-agent"),
        &"test-agent".to_owned()
    );
}
