use std::collections::BTreeMap;
use std::sync::Arc;

use chat_provider::ChatProvider;

/// Providers selectable by id. The first registered provider is the default.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ChatProvider>>,
    default_id: Option<String>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        let id = provider.provider_id().to_owned();
        if self.default_id.is_none() {
            self.default_id = Some(id.clone());
        }
        self.providers.insert(id, provider);
    }

    /// Looks up `id`; an empty id selects the default provider.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn ChatProvider>> {
        let id = id.trim();
        let id = if id.is_empty() {
            self.default_id.as_deref()?
        } else {
            id
        };
        self.providers.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("default_id", &self.default_id)
            .finish()
    }
}
