use reqwest::StatusCode;

use anthropic_api::error::parse_error_message;
use anthropic_api::AnthropicApiError;

#[test]
fn parse_error_message_includes_error_type() {
    let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens: must be positive"}}"#;
    let message = parse_error_message(StatusCode::BAD_REQUEST, body);
    assert_eq!(message, "invalid_request_error: max_tokens: must be positive");
}

#[test]
fn parse_error_message_falls_back_to_raw_body() {
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, "raw failure text");
    assert_eq!(message, "raw failure text");
}

#[test]
fn parse_error_message_uses_reason_for_empty_body() {
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, "");
    assert_eq!(message, "Service Unavailable");
}

#[test]
fn status_errors_expose_their_status() {
    let error = AnthropicApiError::Status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_owned());
    assert_eq!(error.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    assert_eq!(error.to_string(), "HTTP 429 Too Many Requests slow down");
    assert_eq!(AnthropicApiError::MissingApiKey.status(), None);
}
