//! Transport seam: send request bytes to an endpoint, get response bytes. Default: JSON-RPC over HTTP/1.1.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, HOST};
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::service::Endpoint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("http: {0}")]
    Http(String),
    #[error("HTTP status {0} with empty body")]
    Status(u16),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

fn http_err(e: impl fmt::Display) -> TransportError {
    TransportError::Http(e.to_string())
}

/// Connection driver owned by a single call. Dropping it closes the socket, so a call that
/// finishes, fails or is cancelled by a timeout does not leave the connection behind.
struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Moves one encoded request to an endpoint and returns the raw reply. Async so it does not block the runtime.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, payload: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// One `POST http://host:port/path` per call on a fresh connection.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each call, connect included. Without it a hung provider hangs the call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn post(&self, endpoint: &Endpoint, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let authority = endpoint.authority();
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| TransportError::Connect {
                endpoint: authority.clone(),
                reason: e.to_string(),
            })?;
        let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(http_err)?;
        let _conn = ConnectionTask(tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "jsonrpc connection closed with error");
            }
        }));

        let request = Request::builder()
            .method(Method::POST)
            .uri(endpoint.request_path())
            .header(HOST, authority)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(Full::new(Bytes::from(payload)))
            .map_err(http_err)?;
        let response = sender.send_request(request).await.map_err(http_err)?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(http_err)?
            .to_bytes();
        // JSON-RPC servers report faults with 5xx and an envelope body; leave those to the decoder.
        if !status.is_success() && body.is_empty() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, endpoint: &Endpoint, payload: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.post(endpoint, payload))
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => self.post(endpoint, payload).await,
        }
    }
}
