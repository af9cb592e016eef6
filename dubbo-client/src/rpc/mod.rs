//! RPC invoker: one JSON-RPC call to one endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dubbo_client_core::{
    Endpoint, HttpTransport, InvocationError, Request, RequestId, Response, RpcTransport,
};
use serde_json::Value;

/// Performs calls over a transport. Clones share the transport and the id sequence,
/// so ids stay unique across every proxy built from the same invoker.
#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn RpcTransport>,
    next_id: Arc<AtomicU64>,
}

impl Invoker {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Call `method` on `endpoint` with positional `args`. Settles once: the `result`, a remote fault, or a transport failure.
    pub async fn call(
        &self,
        endpoint: &Endpoint,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, InvocationError> {
        call(self.transport.as_ref(), self.next_id(), endpoint, method, args).await
    }
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }
}

/// Helper: send one request with a caller-chosen id and settle the reply.
pub async fn call(
    transport: &dyn RpcTransport,
    id: RequestId,
    endpoint: &Endpoint,
    method: &str,
    args: Vec<Value>,
) -> Result<Value, InvocationError> {
    let request = Request::new(method, args, id);
    let payload = request.to_vec()?;
    tracing::debug!(endpoint = %endpoint, method, id = ?request.id, "jsonrpc call");
    let outcome = match transport.send(endpoint, payload).await {
        Ok(reply) => Response::from_slice(&reply).and_then(|r| r.into_result(&request.id)),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = &outcome {
        tracing::debug!(
            endpoint = %endpoint,
            method,
            id = ?request.id,
            error = %e,
            "jsonrpc call failed"
        );
    }
    outcome
}
