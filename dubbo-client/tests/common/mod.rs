//! Test doubles: a scripted JSON-RPC peer and a coordination store that misbehaves on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dubbo_client::{CoordinationStore, MemoryStore, StoreError};
use dubbo_client_core::{Endpoint, RpcTransport, TransportError};
use serde_json::{json, Value};

type Reply = Box<dyn Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync>;

/// Records every envelope it receives and answers through a script.
pub struct MockRemote {
    sent: Mutex<Vec<(Endpoint, Value)>>,
    reply: Reply,
}

impl MockRemote {
    pub fn new(
        reply: impl Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    /// Answer every request with `result`, echoing its id.
    pub fn returning(result: Value) -> Arc<Self> {
        Self::new(move |req| {
            Ok(serde_json::to_vec(&json!({"jsonrpc": "2.0", "result": result, "id": req["id"]})).unwrap())
        })
    }

    pub fn sent(&self) -> Vec<(Endpoint, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for MockRemote {
    async fn send(&self, endpoint: &Endpoint, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let envelope: Value = serde_json::from_slice(&payload).unwrap();
        self.sent.lock().unwrap().push((endpoint.clone(), envelope.clone()));
        tokio::task::yield_now().await;
        (self.reply)(&envelope)
    }
}

pub enum Fault {
    /// Lose the connection this many times, then behave.
    LoseConnection(u32),
    /// Never answer.
    Hang,
    /// Answer, slowly: each `children` call waits 10ms longer than the one before,
    /// every `ensure_path` waits 50ms.
    Staggered,
}

/// MemoryStore behind a fault injector; counts calls to `children`.
pub struct FlakyStore {
    inner: MemoryStore,
    fault: Fault,
    pub calls: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, fault: Fault) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fault,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::LoseConnection(times) if n < times => {
                Err(StoreError::ConnectionLoss("connection reset".into()))
            }
            Fault::LoseConnection(_) => Ok(()),
            Fault::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Fault::Staggered => {
                tokio::time::sleep(Duration::from_millis(2 + 10 * u64::from(n))).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CoordinationStore for FlakyStore {
    async fn children(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.gate().await?;
        self.inner.children(path).await
    }

    async fn ensure_path(&self, path: &str) -> Result<(), StoreError> {
        if let Fault::Staggered = self.fault {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.inner.ensure_path(path).await
    }

    async fn create_ephemeral(&self, path: &str) -> Result<(), StoreError> {
        self.inner.create_ephemeral(path).await
    }
}

/// Store with `orderService` published the way a Dubbo provider would.
pub fn order_service_store(methods: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store.add_provider(
        "/dubbo",
        "orderService",
        &format!("jsonrpc://10.0.0.5:20880/orderService?application=orders&methods={}&version=1.0", methods),
    );
    store
}
