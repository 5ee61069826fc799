use std::path::Path;
use std::sync::Arc;

use chat_orchestrator::ProviderRegistry;
use chat_provider::ChatProvider;
use chat_provider_anthropic::{AnthropicProvider, ANTHROPIC_PROVIDER_ID};
use chat_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use chat_provider_openai::{OpenAiProvider, OPENAI_PROVIDER_ID};
use tracing::info;

use crate::config::{
    ConfigError, EnvConfig, OpenAiFileConfig, ProviderFileConfig, CONFIG_PATH_ENV_VAR,
    OPENAI_CONFIG_PATH_ENV_VAR,
};

pub const DEFAULT_PROVIDER_ID: &str = MOCK_PROVIDER_ID;

const PROVIDER_IDS: [&str; 3] = [MOCK_PROVIDER_ID, ANTHROPIC_PROVIDER_ID, OPENAI_PROVIDER_ID];

pub fn provider_for_id(
    provider_id: &str,
    env: &EnvConfig,
) -> Result<Arc<dyn ChatProvider>, ConfigError> {
    match provider_id {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        ANTHROPIC_PROVIDER_ID => {
            let path = required_path(provider_id, env.config_path.as_deref(), CONFIG_PATH_ENV_VAR)?;
            let config = ProviderFileConfig::load(path)?;
            Ok(Arc::new(AnthropicProvider::new(config.into_anthropic())?))
        }
        OPENAI_PROVIDER_ID => {
            let path = required_path(
                provider_id,
                env.openai_config_path.as_deref(),
                OPENAI_CONFIG_PATH_ENV_VAR,
            )?;
            let config = OpenAiFileConfig::load(path)?;
            Ok(Arc::new(OpenAiProvider::new(config.into_openai())?))
        }
        unknown => Err(ConfigError::UnsupportedProvider {
            id: unknown.to_string(),
            available: PROVIDER_IDS.join(", "),
        }),
    }
}

fn required_path<'a>(
    provider_id: &str,
    path: Option<&'a Path>,
    variable: &'static str,
) -> Result<&'a Path, ConfigError> {
    path.ok_or_else(|| ConfigError::MissingConfigPath {
        provider: provider_id.to_string(),
        variable,
    })
}

fn is_configured(provider_id: &str, env: &EnvConfig) -> bool {
    match provider_id {
        ANTHROPIC_PROVIDER_ID => env.config_path.is_some(),
        OPENAI_PROVIDER_ID => env.openai_config_path.is_some(),
        _ => true,
    }
}

/// Registry holding every provider the environment can build. The provider
/// selected by `CHAT_AGENT_PROVIDER` is registered first and is the default.
pub fn registry_from_env(env: &EnvConfig) -> Result<ProviderRegistry, ConfigError> {
    let default_id = env.provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID);
    let mut registry = ProviderRegistry::new().with_provider(provider_for_id(default_id, env)?);

    for provider_id in PROVIDER_IDS {
        if provider_id == default_id || !is_configured(provider_id, env) {
            continue;
        }
        registry.register(provider_for_id(provider_id, env)?);
    }

    info!(
        default = default_id,
        providers = %registry.ids().collect::<Vec<_>>().join(","),
        "registered providers"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn provider_for_id_supports_mock() {
        let provider = provider_for_id("mock", &EnvConfig::default()).expect("mock resolves");
        assert_eq!(provider.provider_id(), "mock");
    }

    #[test]
    fn provider_for_id_rejects_unknown_provider() {
        let error = match provider_for_id("custom", &EnvConfig::default()) {
            Ok(_) => panic!("unknown providers should fail"),
            Err(error) => error,
        };

        assert_eq!(
            error.to_string(),
            "Unsupported provider 'custom'. Available providers: mock, anthropic, openai"
        );
    }

    #[test]
    fn remote_providers_require_a_config_path() {
        for (provider_id, variable) in [
            ("anthropic", CONFIG_PATH_ENV_VAR),
            ("openai", OPENAI_CONFIG_PATH_ENV_VAR),
        ] {
            let error = match provider_for_id(provider_id, &EnvConfig::default()) {
                Ok(_) => panic!("missing config path should fail"),
                Err(error) => error,
            };

            assert!(error.to_string().contains(variable), "{error}");
            assert!(matches!(error, ConfigError::MissingConfigPath { .. }));
        }
    }

    #[test]
    fn anthropic_loads_from_config_file() {
        let file = config_file(r#"{"api_key": "sk-test", "models": ["claude-haiku-4-5"]}"#);
        let env = EnvConfig {
            config_path: Some(file.path().to_path_buf()),
            provider_id: Some("anthropic".to_string()),
            ..EnvConfig::default()
        };

        let registry = registry_from_env(&env).expect("registry");
        let provider = registry.resolve("").expect("default provider");
        assert_eq!(provider.provider_id(), "anthropic");
    }

    #[test]
    fn registry_defaults_to_mock() {
        let registry = registry_from_env(&EnvConfig::default()).expect("registry");
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["mock"]);
        assert_eq!(
            registry.resolve("").expect("default").provider_id(),
            "mock"
        );
    }

    #[test]
    fn registry_holds_every_configured_provider() {
        let anthropic = config_file(r#"{"api_key": "sk-ant", "models": ["claude-haiku-4-5"]}"#);
        let openai = config_file(r#"{"api_key": "sk-oai", "models": ["gpt-4o"]}"#);
        let env = EnvConfig {
            provider_id: Some("openai".to_string()),
            config_path: Some(anthropic.path().to_path_buf()),
            openai_config_path: Some(openai.path().to_path_buf()),
            ..EnvConfig::default()
        };

        let registry = registry_from_env(&env).expect("registry");
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["anthropic", "mock", "openai"]
        );
        assert_eq!(
            registry.resolve("").expect("default").provider_id(),
            "openai"
        );
        assert_eq!(
            registry
                .resolve("anthropic")
                .expect("non-default vendor")
                .provider_id(),
            "anthropic"
        );
        assert_eq!(
            registry.resolve("mock").expect("mock vendor").provider_id(),
            "mock"
        );
    }

    #[test]
    fn unconfigured_remote_providers_are_skipped() {
        let anthropic = config_file(r#"{"api_key": "sk-ant", "models": ["claude-haiku-4-5"]}"#);
        let env = EnvConfig {
            config_path: Some(anthropic.path().to_path_buf()),
            ..EnvConfig::default()
        };

        let registry = registry_from_env(&env).expect("registry");
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["anthropic", "mock"]);
        assert_eq!(
            registry.resolve("").expect("default").provider_id(),
            "mock"
        );
        assert!(registry.resolve("openai").is_none());
    }
}
