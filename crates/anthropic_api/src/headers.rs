use std::collections::BTreeMap;

use crate::config::AnthropicApiConfig;
use crate::error::AnthropicApiError;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_ANTHROPIC_VERSION: &str = "anthropic-version";
pub const HEADER_ANTHROPIC_BETA: &str = "anthropic-beta";
pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Build a deterministic header map for Messages API requests.
///
/// `betas` are joined into a single `anthropic-beta` header; blank entries are
/// ignored and no header is sent when none remain.
pub fn build_headers(
    config: &AnthropicApiConfig,
    betas: &[String],
    stream: bool,
) -> Result<BTreeMap<String, String>, AnthropicApiError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(AnthropicApiError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(HEADER_API_KEY.to_owned(), api_key.to_owned());
    headers.insert(
        HEADER_ANTHROPIC_VERSION.to_owned(),
        config.api_version.trim().to_owned(),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    let accept = if stream {
        "text/event-stream"
    } else {
        "application/json"
    };
    headers.insert(HEADER_ACCEPT.to_owned(), accept.to_owned());

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    if let Some(beta) = join_betas(betas) {
        headers.insert(HEADER_ANTHROPIC_BETA.to_owned(), beta);
    }

    Ok(headers)
}

fn join_betas(betas: &[String]) -> Option<String> {
    let joined = betas
        .iter()
        .map(|beta| beta.trim())
        .filter(|beta| !beta.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn default_user_agent() -> String {
    format!("anthropic_api/{}", env!("CARGO_PKG_VERSION"))
}
