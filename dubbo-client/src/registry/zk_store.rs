//! Coordination store backed by a live ZooKeeper ensemble.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zookeeper_client as zk;

use super::protocol::{CoordinationStore, StoreError};

/// ZooKeeper session over `servers`. Connects on first use and reconnects after the
/// session is lost; the session timeout is handed to the server as is.
pub struct ZkStore {
    cluster: String,
    session_timeout: Duration,
    client: Mutex<Option<zk::Client>>,
}

impl ZkStore {
    pub fn new<S: AsRef<str>>(servers: &[S], session_timeout: Duration) -> Self {
        let cluster = servers
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            cluster,
            session_timeout,
            client: Mutex::new(None),
        }
    }

    /// Comma-separated `host:port` list the session connects to.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    async fn client(&self) -> Result<zk::Client, StoreError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }
        let client = zk::Client::connector()
            .session_timeout(self.session_timeout)
            .connect(&self.cluster)
            .await
            .map_err(|e| {
                StoreError::ConnectionLoss(format!("connect to {}: {}", self.cluster, e))
            })?;
        tracing::info!(cluster = %self.cluster, "zookeeper session established");
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Map a server reply, dropping the session when it can no longer be used.
    async fn settle<T>(&self, path: &str, outcome: Result<T, zk::Error>) -> Result<T, StoreError> {
        let e = match outcome {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        Err(match &e {
            zk::Error::NoNode => StoreError::NoNode(path.to_owned()),
            zk::Error::NodeExists => StoreError::NodeExists(path.to_owned()),
            zk::Error::ConnectionLoss => StoreError::ConnectionLoss(e.to_string()),
            zk::Error::SessionExpired | zk::Error::ClientClosed => {
                tracing::warn!(cluster = %self.cluster, error = %e, "zookeeper session lost");
                self.client.lock().await.take();
                StoreError::ConnectionLoss(e.to_string())
            }
            _ => StoreError::Rejected {
                path: path.to_owned(),
                reason: e.to_string(),
            },
        })
    }

    async fn create(&self, path: &str, mode: zk::CreateMode) -> Result<(), StoreError> {
        let client = self.client().await?;
        let options = mode.with_acls(zk::Acls::anyone_all());
        let outcome = client.create(path, &[], &options).await.map(|_| ());
        self.settle(path, outcome).await
    }
}

impl fmt::Debug for ZkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZkStore")
            .field("cluster", &self.cluster)
            .field("session_timeout", &self.session_timeout)
            .finish()
    }
}

#[async_trait]
impl CoordinationStore for ZkStore {
    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let client = self.client().await?;
        let outcome = client.list_children(path).await;
        self.settle(path, outcome).await
    }

    async fn ensure_path(&self, path: &str) -> Result<(), StoreError> {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match self.create(&current, zk::CreateMode::Persistent).await {
                Ok(()) | Err(StoreError::NodeExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn create_ephemeral(&self, path: &str) -> Result<(), StoreError> {
        self.create(path, zk::CreateMode::Ephemeral).await
    }
}
