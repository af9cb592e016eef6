//! Dubbo registry URLs: `protocol://host:port/path?k=v&...`, stored URL-encoded as node names.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use url::form_urlencoded;
use url::{Host, Url};

use crate::service::{Endpoint, ProviderMeta, ServiceKey};

/// The only provider protocol this client speaks.
pub const JSONRPC_PROTOCOL: &str = "jsonrpc";

const ANY: &str = "*";
const DEFAULT_VERSION: &str = "0.0.0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderUrlError {
    #[error("invalid url {url:?}: {reason}")]
    Invalid { url: String, reason: String },
    #[error("url {0:?} has no host")]
    MissingHost(String),
    #[error("url {0:?} has no port")]
    MissingPort(String),
}

/// Decode a registry node name into the URL it carries. Already-decoded names pass through.
pub fn decode_node(node: &str) -> String {
    if node.contains("://") {
        return node.to_owned();
    }
    form_urlencoded::parse(node.as_bytes())
        .next()
        .map(|(k, _)| k.into_owned())
        .unwrap_or_default()
}

/// Encode a URL for use as a registry node name.
pub fn encode_node(url: &str) -> String {
    form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

/// Parsed provider or consumer URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DubboUrl {
    pub protocol: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub parameters: BTreeMap<String, String>,
}

impl DubboUrl {
    pub fn new(protocol: &str, host: &str, port: Option<u16>, path: &str) -> Self {
        Self {
            protocol: protocol.to_owned(),
            host: host.to_owned(),
            port,
            path: path.trim_start_matches('/').to_owned(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ProviderUrlError> {
        let url = Url::parse(raw).map_err(|e| ProviderUrlError::Invalid {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;
        let host = match url.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Domain(d)) if !d.is_empty() => d.to_owned(),
            _ => return Err(ProviderUrlError::MissingHost(raw.to_owned())),
        };
        let parameters = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self {
            protocol: url.scheme().to_owned(),
            host,
            port: url.port(),
            path: url.path().trim_start_matches('/').to_owned(),
            parameters,
        })
    }

    /// Parse a registry node name (URL-encoded or plain).
    pub fn from_node(node: &str) -> Result<Self, ProviderUrlError> {
        Self::parse(&decode_node(node))
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_owned(), value.into());
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn group(&self) -> Option<&str> {
        self.parameter("group")
    }

    pub fn version(&self) -> Option<&str> {
        self.parameter("version").filter(|v| *v != DEFAULT_VERSION)
    }

    /// `methods` parameter split on commas, blanks dropped.
    pub fn methods(&self) -> Vec<String> {
        self.parameter("methods")
            .map(|m| {
                m.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.parameter("enabled") != Some("false")
    }

    /// Whether this provider serves `key` over a protocol this client speaks.
    pub fn matches(&self, key: &ServiceKey) -> bool {
        self.protocol == JSONRPC_PROTOCOL
            && self.is_enabled()
            && qualifier_matches(key.group.as_deref(), self.group())
            && qualifier_matches(
                key.version.as_deref().filter(|v| *v != DEFAULT_VERSION),
                self.version(),
            )
    }

    /// Endpoint and method list for the proxy factory.
    pub fn into_meta(self, key: &ServiceKey) -> Result<ProviderMeta, ProviderUrlError> {
        let port = self
            .port
            .ok_or_else(|| ProviderUrlError::MissingPort(self.to_string()))?;
        let path = if !self.path.is_empty() {
            self.path.clone()
        } else {
            self.parameter("interface")
                .unwrap_or(key.service.as_str())
                .to_owned()
        };
        let endpoint = Endpoint::new(&self.protocol, &self.host, port, &path);
        let methods = self.methods();
        let mut parameters = self.parameters;
        parameters.remove("methods");
        Ok(ProviderMeta::new(endpoint, methods).with_parameters(parameters))
    }
}

fn qualifier_matches(wanted: Option<&str>, offered: Option<&str>) -> bool {
    match wanted {
        Some(ANY) => true,
        wanted => wanted == offered,
    }
}

impl fmt::Display for DubboUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.protocol)?;
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            f.write_str(&self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "/{}", self.path)?;
        if !self.parameters.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.parameters.iter())
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}
