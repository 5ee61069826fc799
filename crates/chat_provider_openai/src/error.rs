use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),
}

/// Readable message from an error body: `error.message` (prefixed with
/// `error.type` when present), a bare `error` string, the body itself, or the
/// status reason.
pub fn parse_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(error_message)
    {
        return message;
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

pub(crate) fn error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    if let Some(text) = error.as_str().filter(|text| !text.is_empty()) {
        return Some(text.to_string());
    }
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())?;
    match error
        .get("type")
        .and_then(Value::as_str)
        .filter(|kind| !kind.is_empty())
    {
        Some(kind) => Some(format!("{kind}: {message}")),
        None => Some(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::parse_error_message;

    #[test]
    fn structured_error_includes_type() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        assert_eq!(
            parse_error_message(StatusCode::UNAUTHORIZED, body),
            "invalid_request_error: Incorrect API key"
        );
    }

    #[test]
    fn string_error_and_fallbacks() {
        assert_eq!(
            parse_error_message(StatusCode::BAD_REQUEST, r#"{"error":"bad model"}"#),
            "bad model"
        );
        assert_eq!(
            parse_error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            parse_error_message(StatusCode::TOO_MANY_REQUESTS, "  "),
            "Too Many Requests"
        );
    }
}
