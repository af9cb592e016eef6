//! Registry from static config: service key -> provider metadata. No coordination service involved.

use std::collections::HashMap;

use async_trait::async_trait;
use dubbo_client_core::{ProviderMeta, Registry, ResolutionError, ServiceKey};

#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    providers: HashMap<ServiceKey, ProviderMeta>,
}

impl StaticRegistry {
    pub fn new(providers: HashMap<ServiceKey, ProviderMeta>) -> Self {
        Self { providers }
    }

    /// Add or replace the provider for `key`.
    pub fn provider(mut self, key: ServiceKey, meta: ProviderMeta) -> Self {
        self.providers.insert(key, meta);
        self
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn resolve(&self, key: &ServiceKey) -> Result<ProviderMeta, ResolutionError> {
        self.providers
            .get(key)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound { service: key.clone() })
    }
}
