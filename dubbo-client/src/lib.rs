//! Dubbo JSON-RPC client: resolve a provider through the registry, get back a proxy whose methods call it.
//!
//! ```no_run
//! use dubbo_client::{DubboClient, RegistryConfig};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = DubboClient::new();
//! client.registry("zookeeper://127.0.0.1:2181", RegistryConfig::default())?;
//! let orders = client.get_provider("com.acme.OrderService", None, Some("1.0")).await?;
//! if let Some(create) = orders.method("createOrder") {
//!     let order = create.call(vec![json!(42)]).await?;
//!     println!("{}", order);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod proxy;
pub mod registry;
pub mod rpc;

pub use client::{get_provider, ClientError, DubboClient};
pub use config::{AppIdentity, RegistryConfig, ZkOptions};
pub use proxy::{MethodFuture, Proxy, ProxyFactory, RemoteMethod};
pub use registry::{
    configure, configure_with_store, ConfigError, CoordinationStore, MemoryStore,
    RegistryAddress, RegistryHandle, StaticRegistry, StoreError, ZkStore, ZookeeperRegistry,
};
pub use rpc::Invoker;

pub use dubbo_client_core::{
    ConstructionError, Endpoint, HttpTransport, InvocationError, ProviderMeta, Registry,
    ResolutionError, RpcTransport, ServiceKey, TransportError,
};
