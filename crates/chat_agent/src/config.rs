//! Environment and provider file configuration.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_provider::ProviderError;
use chat_provider_anthropic::AnthropicProviderConfig;
use chat_provider_openai::OpenAiProviderConfig;
use serde::Deserialize;
use thiserror::Error;

pub const PROVIDER_ENV_VAR: &str = "CHAT_AGENT_PROVIDER";
pub const CONFIG_PATH_ENV_VAR: &str = "CHAT_AGENT_CONFIG_PATH";
pub const OPENAI_CONFIG_PATH_ENV_VAR: &str = "CHAT_AGENT_OPENAI_CONFIG_PATH";
pub const HOME_ENV_VAR: &str = "CHAT_AGENT_HOME";
pub const STREAM_ENV_VAR: &str = "CHAT_AGENT_STREAM";
pub const PROJECT_ROOT_ENV_VAR: &str = "CHAT_AGENT_PROJECT_ROOT";

const DEFAULT_HOME_SUFFIX: &str = ".config/chat_agent";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported provider '{id}'. Available providers: {available}")]
    UnsupportedProvider { id: String, available: String },

    #[error("provider '{provider}' requires {variable} to name a JSON config file")]
    MissingConfigPath {
        provider: String,
        variable: &'static str,
    },

    #[error("failed to read provider config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid provider config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid provider config: {0}")]
    Invalid(&'static str),

    #[error("cannot resolve storage root: set {HOME_ENV_VAR} or HOME")]
    NoStorageRoot,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Process settings read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub provider_id: Option<String>,
    pub config_path: Option<PathBuf>,
    pub openai_config_path: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub stream: bool,
    pub project_root: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            provider_id: env_string_opt(PROVIDER_ENV_VAR).map(|value| value.trim().to_string()),
            config_path: env_string_opt(CONFIG_PATH_ENV_VAR).map(PathBuf::from),
            openai_config_path: env_string_opt(OPENAI_CONFIG_PATH_ENV_VAR).map(PathBuf::from),
            home: env_string_opt(HOME_ENV_VAR).map(PathBuf::from),
            stream: env_flag(STREAM_ENV_VAR),
            project_root: env_string_opt(PROJECT_ROOT_ENV_VAR).map(PathBuf::from),
        }
    }

    /// Directory holding sessions, contexts, patterns and strategies.
    pub fn storage_root(&self) -> Result<PathBuf, ConfigError> {
        if let Some(home) = &self.home {
            return Ok(home.clone());
        }
        env_string_opt("HOME")
            .map(|home| Path::new(&home).join(DEFAULT_HOME_SUFFIX))
            .ok_or(ConfigError::NoStorageRoot)
    }
}

/// Contents of the file named by `CHAT_AGENT_CONFIG_PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderFileConfig {
    pub api_key: String,
    pub models: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_sec: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub model_betas: Option<BTreeMap<String, Vec<String>>>,
}

impl ProviderFileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty"));
        }
        if !self.models.iter().any(|model| !model.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "models must include at least one non-empty model id",
            ));
        }
        if self.timeout_sec == Some(0) {
            return Err(ConfigError::Invalid("timeout_sec must be greater than 0"));
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::Invalid("max_tokens must be greater than 0"));
        }
        Ok(())
    }

    #[must_use]
    pub fn into_anthropic(self) -> AnthropicProviderConfig {
        let models = self
            .models
            .into_iter()
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .collect();
        let mut config = AnthropicProviderConfig::new(self.api_key, models);
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout_sec) = self.timeout_sec {
            config = config.with_timeout(Duration::from_secs(timeout_sec));
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(model_betas) = self.model_betas {
            config = config.with_model_betas(model_betas);
        }
        config
    }
}

/// Contents of the file named by `CHAT_AGENT_OPENAI_CONFIG_PATH`. An empty
/// `models` list asks the server for its models.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiFileConfig {
    pub api_key: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

impl OpenAiFileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty"));
        }
        if config.timeout_sec == Some(0) {
            return Err(ConfigError::Invalid("timeout_sec must be greater than 0"));
        }
        Ok(config)
    }

    #[must_use]
    pub fn into_openai(self) -> OpenAiProviderConfig {
        let mut config = OpenAiProviderConfig::new(self.api_key, self.models);
        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(timeout_sec) = self.timeout_sec {
            config = config.with_timeout(Duration::from_secs(timeout_sec));
        }
        config
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
