//! Coordination-service seam: the hierarchical node operations the ZooKeeper registry needs.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no node {0}")]
    NoNode(String),
    #[error("node {0} already exists")]
    NodeExists(String),
    #[error("connection lost: {0}")]
    ConnectionLoss(String),
    #[error("request on {path} rejected: {reason}")]
    Rejected { path: String, reason: String },
}

impl StoreError {
    /// Only connectivity problems are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::ConnectionLoss(_))
    }
}

/// Read/write access to a ZooKeeper-like tree. Session handling, watches and pooling live behind it.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Names (not full paths) of the direct children of `path`.
    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Create `path` and any missing ancestors as persistent nodes. Existing nodes are fine.
    async fn ensure_path(&self, path: &str) -> Result<(), StoreError>;

    /// Create a node that lives as long as this client's session. The parent must exist.
    async fn create_ephemeral(&self, path: &str) -> Result<(), StoreError>;
}
