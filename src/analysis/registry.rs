use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis::provider::AnalysisProvider;
use crate::analysis::providers::http::HttpAnalysisProvider;
use crate::analysis::providers::mock::MockAnalysisProvider;
use crate::config::AppConfig;
use crate::errors::{LeafLensError, LeafLensResult};

/// Registry of analysis providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn AnalysisProvider>>,
    active: String,
}

impl ProviderRegistry {
    pub fn new(active: String) -> Self {
        Self {
            providers: HashMap::new(),
            active,
        }
    }

    pub fn register(&mut self, provider: Arc<dyn AnalysisProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get_active(&self) -> LeafLensResult<Arc<dyn AnalysisProvider>> {
        self.providers.get(&self.active).cloned().ok_or_else(|| {
            LeafLensError::Config(format!(
                "Active provider '{}' not found in registry",
                self.active
            ))
        })
    }

    pub fn set_active(&mut self, name: String) -> LeafLensResult<()> {
        if self.providers.contains_key(&name) {
            self.active = name;
            Ok(())
        } else {
            Err(LeafLensError::Config(format!(
                "Provider '{name}' not registered"
            )))
        }
    }

    pub fn list_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Build a registry from the loaded app config. The built-in mock
    /// provider is always registered; HTTP backends come from
    /// `[provider.endpoints]`. API keys are read from environment variables
    /// named `LEAFLENS_<ID>_API_KEY`, falling back to the config entry.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new(config.provider.active.clone());
        registry.register(Arc::new(MockAnalysisProvider::new(config.mock.clone())));

        for (id, entry) in &config.provider.endpoints {
            let api_key = std::env::var(format!("LEAFLENS_{}_API_KEY", id.to_uppercase()))
                .ok()
                .or_else(|| entry.api_key.clone());
            registry.register(Arc::new(HttpAnalysisProvider::new(
                id.clone(),
                entry.api_base.clone(),
                api_key,
            )));
            tracing::debug!(endpoint = %id, api_base = %entry.api_base, "HTTP provider registered");
        }

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointEntry;

    #[test]
    fn test_default_config_resolves_mock() {
        let registry = ProviderRegistry::from_config(&AppConfig::default());
        let provider = registry.get_active().unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_unknown_active_provider_is_config_error() {
        let mut config = AppConfig::default();
        config.provider.active = "missing".into();
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.get_active().is_err());
    }

    #[test]
    fn test_endpoints_register_alongside_mock() {
        let mut config = AppConfig::default();
        config.provider.endpoints.insert(
            "greenhouse".into(),
            EndpointEntry {
                display_name: "Greenhouse API".into(),
                api_base: "https://api.example.com/analyze".into(),
                api_key: None,
            },
        );
        config.provider.active = "greenhouse".into();

        let registry = ProviderRegistry::from_config(&config);
        let mut names = registry.list_names();
        names.sort();
        assert_eq!(names, vec!["greenhouse", "mock"]);
        assert_eq!(registry.get_active().unwrap().name(), "greenhouse");
    }

    #[test]
    fn test_set_active_requires_registered_provider() {
        let mut registry = ProviderRegistry::from_config(&AppConfig::default());
        assert!(registry.set_active("nope".into()).is_err());
        assert!(registry.set_active("mock".into()).is_ok());
    }
}
