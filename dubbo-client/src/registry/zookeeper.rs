//! Registry over a ZooKeeper-style tree in Dubbo's layout:
//! `{root}/{service}/providers/{encoded url}` and `{root}/{service}/consumers/{encoded url}`.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dubbo_client_core::{encode_node, DubboUrl, ProviderMeta, Registry, ResolutionError, ServiceKey};
use tokio::sync::Mutex;

use super::protocol::{CoordinationStore, StoreError};
use super::ConfigError;
use crate::config::RegistryConfig;

pub const DEFAULT_ROOT: &str = "/dubbo";
pub const DEFAULT_ZK_PORT: u16 = 2181;

/// Parsed registry URL: `zookeeper://h1:2181,h2:2181/root`, `zk://...`, or bare `h1:2181[/root]`.
/// A `?backup=h2:2181,h3:2181` query adds servers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryAddress {
    pub servers: Vec<String>,
    pub root: String,
}

impl RegistryAddress {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRegistryUrl {
            url: url.to_owned(),
            reason: reason.to_owned(),
        };
        let rest = match url.trim().split_once("://") {
            Some(("zookeeper", rest)) | Some(("zk", rest)) => rest,
            Some((scheme, _)) => return Err(ConfigError::UnsupportedScheme(scheme.to_owned())),
            None => url.trim(),
        };
        let (rest, query) = rest.split_once('?').unwrap_or((rest, ""));
        let (hosts, root) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let backups = query
            .split('&')
            .filter_map(|pair| pair.strip_prefix("backup="))
            .flat_map(|v| v.split(','));

        let mut servers = Vec::new();
        for server in hosts.split(',').chain(backups).map(str::trim) {
            if server.is_empty() {
                continue;
            }
            let (host, port) = match server.rsplit_once(':') {
                Some((host, port)) => {
                    let port: u16 = port.parse().map_err(|_| invalid("bad port"))?;
                    (host, port)
                }
                None => (server, DEFAULT_ZK_PORT),
            };
            if host.is_empty() {
                return Err(invalid("empty host"));
            }
            let server = format!("{}:{}", host, port);
            if !servers.contains(&server) {
                servers.push(server);
            }
        }
        if servers.is_empty() {
            return Err(invalid("no servers"));
        }

        let root = root.trim_end_matches('/');
        let root = if root.is_empty() { DEFAULT_ROOT } else { root };
        Ok(Self {
            servers,
            root: root.to_owned(),
        })
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zookeeper://{}{}", self.servers.join(","), self.root)
    }
}

pub struct ZookeeperRegistry {
    address: RegistryAddress,
    config: RegistryConfig,
    store: Arc<dyn CoordinationStore>,
    local_host: String,
    /// Keys this handle already announced a consumer node for. Held across the store
    /// calls so concurrent lookups of one key register a single node.
    registered: Mutex<HashSet<ServiceKey>>,
}

impl ZookeeperRegistry {
    pub fn new(
        address: RegistryAddress,
        config: RegistryConfig,
        store: Arc<dyn CoordinationStore>,
    ) -> Self {
        let local_host = local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| "127.0.0.1".to_owned());
        Self {
            address,
            config,
            store,
            local_host,
            registered: Mutex::new(HashSet::new()),
        }
    }

    /// Host written into consumer URLs. Defaults to the first non-loopback local address.
    pub fn with_local_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = host.into();
        self
    }

    pub fn address(&self) -> &RegistryAddress {
        &self.address
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn service_path(&self, service: &str, category: &str) -> String {
        format!("{}/{}/{}", self.address.root, service, category)
    }

    fn unavailable(&self, attempts: u32, cause: String) -> ResolutionError {
        ResolutionError::RegistryUnavailable {
            registry: self.address.to_string(),
            attempts,
            cause,
        }
    }

    /// Run a store operation under the session timeout, retrying connectivity failures.
    /// Outer error: gave up. Inner error: the store answered with a non-retryable error.
    async fn with_retries<T, F, Fut>(
        &self,
        op: &str,
        mut f: F,
    ) -> Result<Result<T, StoreError>, ResolutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let zk = &self.config.zk;
        let attempts = zk.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let cause = match tokio::time::timeout(zk.session_timeout, f()).await {
                Ok(Err(e)) if e.is_retryable() => e.to_string(),
                Ok(outcome) => return Ok(outcome),
                Err(_) => format!("{} timed out after {:?}", op, zk.session_timeout),
            };
            if attempt >= attempts {
                return Err(self.unavailable(attempt, cause));
            }
            tracing::warn!(
                registry = %self.address,
                op,
                attempt,
                cause = %cause,
                "registry request failed, retrying"
            );
            tokio::time::sleep(zk.spin_delay).await;
        }
    }

    async fn lookup(&self, key: &ServiceKey) -> Result<ProviderMeta, ResolutionError> {
        let path = self.service_path(&key.service, "providers");
        let nodes = match self
            .with_retries("list providers", || self.store.children(&path))
            .await?
        {
            Ok(nodes) => nodes,
            Err(StoreError::NoNode(_)) => {
                return Err(ResolutionError::NotFound {
                    service: key.clone(),
                })
            }
            Err(e) => return Err(self.unavailable(1, e.to_string())),
        };

        for node in &nodes {
            let url = match DubboUrl::from_node(node) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(
                        service = %key,
                        node = %node,
                        error = %e,
                        "skipping unreadable provider node"
                    );
                    continue;
                }
            };
            if !url.matches(key) {
                continue;
            }
            match url.into_meta(key) {
                Ok(meta) => return Ok(meta),
                Err(e) => {
                    tracing::debug!(service = %key, error = %e, "skipping unusable provider");
                }
            }
        }
        Err(ResolutionError::NotFound {
            service: key.clone(),
        })
    }

    fn consumer_url(&self, key: &ServiceKey, application: &str, meta: &ProviderMeta) -> DubboUrl {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut url = DubboUrl::new("consumer", &self.local_host, None, &key.service);
        for (k, v) in self.config.app.url_parameters() {
            url = url.with_parameter(k, v);
        }
        let mut url = url
            .with_parameter("application", application)
            .with_parameter("category", "consumers")
            .with_parameter("check", "false")
            .with_parameter("side", "consumer")
            .with_parameter("interface", key.service.as_str())
            .with_parameter("methods", meta.methods.join(","))
            .with_parameter("pid", std::process::id().to_string())
            .with_parameter("timestamp", timestamp.to_string());
        if let Some(group) = &key.group {
            url = url.with_parameter("group", group.as_str());
        }
        if let Some(version) = &key.version {
            url = url.with_parameter("version", version.as_str());
        }
        url
    }

    /// Announce this client under `{root}/{service}/consumers`, once per key.
    async fn register_consumer(
        &self,
        key: &ServiceKey,
        meta: &ProviderMeta,
    ) -> Result<(), ResolutionError> {
        let Some(application) = self.config.app.application.as_deref() else {
            return Ok(());
        };
        let mut registered = self.registered.lock().await;
        if registered.contains(key) {
            return Ok(());
        }

        let dir = self.service_path(&key.service, "consumers");
        let url = self.consumer_url(key, application, meta);
        let node = format!("{}/{}", dir, encode_node(&url.to_string()));
        match self
            .with_retries("create consumers path", || self.store.ensure_path(&dir))
            .await?
        {
            Ok(()) | Err(StoreError::NodeExists(_)) => {}
            Err(e) => return Err(self.unavailable(1, e.to_string())),
        }
        match self
            .with_retries("register consumer", || self.store.create_ephemeral(&node))
            .await?
        {
            Ok(()) | Err(StoreError::NodeExists(_)) => {}
            Err(e) => return Err(self.unavailable(1, e.to_string())),
        }

        registered.insert(key.clone());
        tracing::info!(
            service = %key,
            application,
            registry = %self.address,
            "registered consumer"
        );
        Ok(())
    }
}

#[async_trait]
impl Registry for ZookeeperRegistry {
    async fn resolve(&self, key: &ServiceKey) -> Result<ProviderMeta, ResolutionError> {
        let meta = self.lookup(key).await?;
        self.register_consumer(key, &meta).await?;
        Ok(meta)
    }
}
