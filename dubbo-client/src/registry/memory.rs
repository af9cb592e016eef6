//! In-process coordination store. Handy for embedding a fixed topology and for tests.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use dubbo_client_core::encode_node;

use super::protocol::{CoordinationStore, StoreError};

/// Node tree held in memory. Clones share the same tree.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    nodes: Arc<RwLock<BTreeSet<String>>>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(i) => Some(&path[..i]),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and all its ancestors.
    pub fn insert(&self, path: &str) {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let mut current = Some(normalize(path));
        while let Some(p) = current {
            current = parent(&p).map(str::to_owned);
            nodes.insert(p);
        }
    }

    /// Remove `path` and everything below it. Returns whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        let path = normalize(path);
        let prefix = format!("{}/", path);
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let existed = nodes.remove(&path);
        nodes.retain(|n| !n.starts_with(&prefix));
        existed
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&normalize(path))
    }

    /// Publish a provider URL the way Dubbo does: `{root}/{service}/providers/{encoded url}`.
    pub fn add_provider(&self, root: &str, service: &str, url: &str) {
        self.insert(&format!(
            "{}/{}/providers/{}",
            normalize(root),
            service,
            encode_node(url)
        ));
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let path = normalize(path);
        let nodes = self.nodes.read().unwrap_or_else(PoisonError::into_inner);
        if path != "/" && !nodes.contains(&path) {
            return Err(StoreError::NoNode(path));
        }
        let prefix = if path == "/" { path.clone() } else { format!("{}/", path) };
        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|n| n.starts_with(&prefix))
            .map(|n| &n[prefix.len()..])
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_owned)
            .collect())
    }

    async fn ensure_path(&self, path: &str) -> Result<(), StoreError> {
        self.insert(path);
        Ok(())
    }

    async fn create_ephemeral(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        if nodes.contains(&path) {
            return Err(StoreError::NodeExists(path));
        }
        if let Some(p) = parent(&path) {
            if p != "/" && !nodes.contains(p) {
                return Err(StoreError::NoNode(p.to_owned()));
            }
        }
        nodes.insert(path);
        Ok(())
    }
}
