//! Dubbo client core: service keys, provider metadata, JSON-RPC envelope, registry and transport seams.

pub mod envelope;
pub mod provider_url;
pub mod registry;
pub mod service;
pub mod transport;

pub use envelope::{Request, RequestId, Response, JSONRPC_VERSION};
pub use provider_url::{decode_node, encode_node, DubboUrl, ProviderUrlError, JSONRPC_PROTOCOL};
pub use registry::Registry;
pub use service::{Endpoint, ProviderMeta, ServiceKey};
pub use transport::{HttpTransport, RpcTransport, TransportError};

use thiserror::Error;

/// Registry lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no provider registered for {service}")]
    NotFound { service: ServiceKey },
    #[error("registry {registry} unavailable after {attempts} attempt(s): {cause}")]
    RegistryUnavailable {
        registry: String,
        attempts: u32,
        cause: String,
    },
}

/// Proxy could not be built from resolved metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("provider {service} does not expose any method")]
    NoExposedMethods { service: ServiceKey },
}

/// A single remote call failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    /// Connection, framing or decoding problem; the remote never produced a usable answer.
    #[error("transport failure: {0}")]
    TransportFailure(String),
    /// The remote answered with a JSON-RPC `error` member, kept as sent.
    #[error("remote fault: {0}")]
    RemoteFault(serde_json::Value),
}

impl From<TransportError> for InvocationError {
    fn from(e: TransportError) -> Self {
        InvocationError::TransportFailure(e.to_string())
    }
}
