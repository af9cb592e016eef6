//! Client facade: configure a registry, then get callable providers from it.

use std::sync::Arc;

use dubbo_client_core::{ConstructionError, Registry, ResolutionError, RpcTransport, ServiceKey};
use thiserror::Error;

use crate::config::RegistryConfig;
use crate::proxy::{Proxy, ProxyFactory};
use crate::registry::{self, ConfigError, CoordinationStore, RegistryHandle};
use crate::rpc::Invoker;

/// Why `get_provider` failed. Stage errors are carried unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error("no registry configured; call registry() first")]
    RegistryNotConfigured,
}

/// Entry point: `.registry(url, config)`, then `get_provider(service, group, version)`.
/// Cloning is cheap; clones share the registry handle, store and transport.
#[derive(Clone, Default)]
pub struct DubboClient {
    store: Option<Arc<dyn CoordinationStore>>,
    registry: Option<RegistryHandle>,
    factory: ProxyFactory,
}

impl DubboClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read provider nodes from `store` instead of connecting to the ZooKeeper named in `registry()`.
    pub fn store(mut self, store: Arc<dyn CoordinationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Transport for remote calls. Default: JSON-RPC over HTTP.
    pub fn transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.factory = ProxyFactory::new(Invoker::new(transport));
        self
    }

    /// Use an already built registry (static config, custom implementation).
    pub fn with_registry(mut self, registry: RegistryHandle) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Configure the registry at `url`. Calling again replaces the previous handle;
    /// proxies built earlier keep their endpoints.
    pub fn registry(
        &mut self,
        url: &str,
        config: RegistryConfig,
    ) -> Result<&mut Self, ConfigError> {
        let handle = match &self.store {
            Some(store) => registry::configure_with_store(url, config, store.clone())?,
            None => registry::configure(url, config)?,
        };
        self.registry = Some(handle);
        Ok(self)
    }

    pub fn registry_handle(&self) -> Option<&RegistryHandle> {
        self.registry.as_ref()
    }

    /// Resolve `service` (optionally qualified by group and version) and build its proxy.
    /// Every call resolves afresh.
    pub async fn get_provider(
        &self,
        service: &str,
        group: Option<&str>,
        version: Option<&str>,
    ) -> Result<Proxy, ClientError> {
        let registry = self
            .registry
            .as_deref()
            .ok_or(ClientError::RegistryNotConfigured)?;
        let key = ServiceKey::from_parts(service, group, version);
        get_provider(registry, &self.factory, &key).await
    }
}

/// Helper: resolve `key` through `registry` and build its proxy with `factory`.
/// Resolving -> Building -> Ready, or Failed with the stage's own error.
pub async fn get_provider(
    registry: &dyn Registry,
    factory: &ProxyFactory,
    key: &ServiceKey,
) -> Result<Proxy, ClientError> {
    tracing::debug!(service = %key, "resolving provider");
    let meta = match registry.resolve(key).await {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(service = %key, error = %e, "provider resolution failed");
            return Err(e.into());
        }
    };
    tracing::debug!(
        service = %key,
        endpoint = %meta.endpoint,
        methods = meta.methods.len(),
        "building proxy"
    );
    let proxy = factory.build(meta, key).map_err(|e| {
        tracing::debug!(service = %key, error = %e, "proxy construction failed");
        e
    })?;
    tracing::debug!(service = %key, endpoint = %proxy.endpoint(), "provider ready");
    Ok(proxy)
}
