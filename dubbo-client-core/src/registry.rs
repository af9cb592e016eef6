//! Registry trait: resolve(service key) -> provider metadata. Implemented by the client crate's registries.

use async_trait::async_trait;

use crate::service::{ProviderMeta, ServiceKey};
use crate::ResolutionError;

/// How to find a provider for a service. Implementations: ZooKeeper layout, static config, etc.
/// Every call is a fresh lookup; nothing is cached between calls.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn resolve(&self, key: &ServiceKey) -> Result<ProviderMeta, ResolutionError>;
}
