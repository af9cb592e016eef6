//! Registry clients: ZooKeeper layout over a coordination store, or static config.

mod memory;
mod protocol;
mod static_registry;
mod zk_store;
mod zookeeper;

pub use memory::MemoryStore;
pub use protocol::{CoordinationStore, StoreError};
pub use static_registry::StaticRegistry;
pub use zk_store::ZkStore;
pub use zookeeper::{RegistryAddress, ZookeeperRegistry, DEFAULT_ROOT, DEFAULT_ZK_PORT};

use std::sync::Arc;

use dubbo_client_core::Registry;
use thiserror::Error;

use crate::config::RegistryConfig;

/// Shared handle to a configured registry. Clone freely; the facade keeps one and hands it out.
pub type RegistryHandle = Arc<dyn Registry>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid registry url {url:?}: {reason}")]
    InvalidRegistryUrl { url: String, reason: String },
    #[error("unsupported registry scheme {0:?}")]
    UnsupportedScheme(String),
}

/// Registry backed by the ZooKeeper ensemble at `url`. The session is opened on first lookup
/// with `config.zk.session_timeout`.
pub fn configure(url: &str, config: RegistryConfig) -> Result<RegistryHandle, ConfigError> {
    let address = RegistryAddress::parse(url)?;
    let store = Arc::new(ZkStore::new(&address.servers, config.zk.session_timeout));
    Ok(connect(address, config, store))
}

/// Same as [`configure`], but nodes are read from and written to `store` instead of ZooKeeper.
pub fn configure_with_store(
    url: &str,
    config: RegistryConfig,
    store: Arc<dyn CoordinationStore>,
) -> Result<RegistryHandle, ConfigError> {
    let address = RegistryAddress::parse(url)?;
    Ok(connect(address, config, store))
}

fn connect(
    address: RegistryAddress,
    config: RegistryConfig,
    store: Arc<dyn CoordinationStore>,
) -> RegistryHandle {
    tracing::info!(
        registry = %address,
        session_timeout = ?config.zk.session_timeout,
        retries = config.zk.retries,
        "registry configured"
    );
    Arc::new(ZookeeperRegistry::new(address, config, store))
}
