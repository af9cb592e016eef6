//! Service identity and resolved provider metadata.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical service: name plus optional group and version. `None` means "default".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub service: String,
    pub group: Option<String>,
    pub version: Option<String>,
}

impl ServiceKey {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            group: None,
            version: None,
        }
    }

    /// Build from facade arguments; blank group/version count as absent.
    pub fn from_parts(service: &str, group: Option<&str>, version: Option<&str>) -> Self {
        Self::new(service)
            .with_group(group.filter(|g| !g.is_empty()).map(str::to_owned))
            .with_version(version.filter(|v| !v.is_empty()).map(str::to_owned))
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// `group/service:version`, absent parts omitted.
impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group) = &self.group {
            write!(f, "{}/", group)?;
        }
        f.write_str(&self.service)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}

/// Where a provider listens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Request path without the leading slash (usually the service interface).
    pub path: String,
}

impl Endpoint {
    pub fn new(protocol: &str, host: &str, port: u16, path: &str) -> Self {
        Self {
            protocol: protocol.to_owned(),
            host: host.to_owned(),
            port,
            path: path.trim_start_matches('/').to_owned(),
        }
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Origin-form request target: `/path`.
    pub fn request_path(&self) -> String {
        format!("/{}", self.path)
    }

    /// HTTP URL JSON-RPC requests are posted to.
    pub fn http_url(&self) -> String {
        format!("http://{}{}", self.authority(), self.request_path())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.protocol, self.authority(), self.request_path())
    }
}

/// Snapshot of one provider as read from the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub endpoint: Endpoint,
    /// Exposed method names in registry order, without duplicates.
    pub methods: Vec<String>,
    /// Remaining provider URL parameters (application, interface, side, ...).
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl ProviderMeta {
    pub fn new<I, S>(endpoint: Endpoint, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for m in methods {
            let m = m.into();
            if !seen.contains(&m) {
                seen.push(m);
            }
        }
        Self {
            endpoint,
            methods: seen,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}
