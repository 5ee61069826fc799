use std::fmt;

use serde::{Deserialize, Serialize};

/// Temperature sent when the caller does not override top-p.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Top-p default. Any other value counts as an explicit caller override.
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_THINK_START_TAG: &str = "<think>";
pub const DEFAULT_THINK_END_TAG: &str = "</think>";

const MAX_THINKING_BUDGET: u32 = 10_000;

/// Requested reasoning effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ThinkingLevel {
    Off,
    Low,
    Medium,
    High,
    /// Explicit token budget in `1..=10000`.
    Budget(u32),
}

impl ThinkingLevel {
    /// Parses a level name (case-insensitive) or an explicit token budget.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_ascii_lowercase();
        match lower.as_str() {
            "off" => Some(Self::Off),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|tokens| (1..=MAX_THINKING_BUDGET).contains(tokens))
                .map(Self::Budget),
        }
    }

    /// Token budget for enabled levels, `None` when thinking is off.
    #[must_use]
    pub fn budget_tokens(&self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::Low => Some(1024),
            Self::Medium => Some(2048),
            Self::High => Some(4096),
            Self::Budget(tokens) => Some(*tokens),
        }
    }
}

impl fmt::Display for ThinkingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
            Self::Budget(tokens) => write!(f, "{tokens}"),
        }
    }
}

impl TryFrom<String> for ThinkingLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid thinking level '{value}'"))
    }
}

impl From<ThinkingLevel> for String {
    fn from(level: ThinkingLevel) -> Self {
        level.to_string()
    }
}

/// The single sampling control transmitted to providers that reject both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingParam {
    Temperature(f64),
    TopP(f64),
}

/// Per-exchange options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub thinking: Option<ThinkingLevel>,
    /// Assemble the conversation in raw mode.
    pub raw: bool,
    /// Hide reasoning blocks from streamed and final output.
    pub suppress_think: bool,
    pub think_start_tag: String,
    pub think_end_tag: String,
    pub search: bool,
    pub search_location: Option<String>,
    pub model_context_length: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            thinking: None,
            raw: false,
            suppress_think: false,
            think_start_tag: DEFAULT_THINK_START_TAG.to_string(),
            think_end_tag: DEFAULT_THINK_END_TAG.to_string(),
            search: false,
            search_location: None,
            model_context_length: 0,
        }
    }
}

impl ChatOptions {
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Temperature unless the caller moved top-p away from its default.
    #[must_use]
    pub fn sampling(&self) -> SamplingParam {
        if (self.top_p - DEFAULT_TOP_P).abs() > f64::EPSILON {
            SamplingParam::TopP(self.top_p)
        } else {
            SamplingParam::Temperature(self.temperature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_defaults_to_temperature() {
        let options = ChatOptions {
            temperature: 0.3,
            ..ChatOptions::default()
        };
        assert_eq!(options.sampling(), SamplingParam::Temperature(0.3));
    }

    #[test]
    fn sampling_uses_top_p_when_overridden() {
        let options = ChatOptions {
            temperature: 0.3,
            top_p: 0.5,
            ..ChatOptions::default()
        };
        assert_eq!(options.sampling(), SamplingParam::TopP(0.5));
    }

    #[test]
    fn thinking_level_parses_names_and_budgets() {
        assert_eq!(ThinkingLevel::parse("HIGH"), Some(ThinkingLevel::High));
        assert_eq!(ThinkingLevel::parse("off"), Some(ThinkingLevel::Off));
        assert_eq!(ThinkingLevel::parse("2500"), Some(ThinkingLevel::Budget(2500)));
        assert_eq!(ThinkingLevel::parse("0"), None);
        assert_eq!(ThinkingLevel::parse("10001"), None);
        assert_eq!(ThinkingLevel::parse("extreme"), None);
    }

    #[test]
    fn thinking_budgets_match_levels() {
        assert_eq!(ThinkingLevel::Off.budget_tokens(), None);
        assert_eq!(ThinkingLevel::Low.budget_tokens(), Some(1024));
        assert_eq!(ThinkingLevel::Medium.budget_tokens(), Some(2048));
        assert_eq!(ThinkingLevel::High.budget_tokens(), Some(4096));
        assert_eq!(ThinkingLevel::Budget(77).budget_tokens(), Some(77));
    }

    #[test]
    fn options_deserialize_from_camel_case_with_defaults() {
        let options: ChatOptions = serde_json::from_str(
            r#"{"model":"m","topP":0.4,"thinking":"medium","suppressThink":true}"#,
        )
        .expect("options parse");

        assert_eq!(options.model, "m");
        assert_eq!(options.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(options.thinking, Some(ThinkingLevel::Medium));
        assert!(options.suppress_think);
        assert_eq!(options.think_start_tag, DEFAULT_THINK_START_TAG);
        assert_eq!(options.sampling(), SamplingParam::TopP(0.4));
    }

    #[test]
    fn invalid_thinking_level_is_rejected_on_deserialize() {
        let error = serde_json::from_str::<ChatOptions>(r#"{"thinking":"lots"}"#)
            .expect_err("invalid level must fail");
        assert!(error.to_string().contains("invalid thinking level"));
    }
}
