//! JSON-RPC 2.0 request/response framing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::InvocationError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id. Requests built here always use numbers; servers may echo strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(u64),
    String(String),
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        RequestId::Number(id)
    }
}

/// `{"jsonrpc":"2.0","method":...,"params":[...],"id":...}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RequestId,
}

impl Request {
    pub fn new(method: &str, params: Vec<Value>, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.to_owned(),
            params,
            id: id.into(),
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, InvocationError> {
        serde_json::to_vec(self).map_err(|e| InvocationError::TransportFailure(e.to_string()))
    }
}

/// Response as received. `result: null` is kept as `Some(Value::Null)`; only a missing member is `None`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub error: Option<Value>,
    #[serde(default)]
    pub id: Option<RequestId>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Response {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvocationError> {
        serde_json::from_slice(bytes).map_err(|e| {
            InvocationError::TransportFailure(format!("malformed JSON-RPC response: {}", e))
        })
    }

    /// Settle a call: `result` on success, `error` as a remote fault, anything else a protocol failure.
    /// A `null` id is accepted, since servers send it when they could not read the request id.
    pub fn into_result(self, expected: &RequestId) -> Result<Value, InvocationError> {
        if let Some(id) = &self.id {
            if id != expected {
                return Err(InvocationError::TransportFailure(format!(
                    "response id {:?} does not match request id {:?}",
                    id, expected
                )));
            }
        }
        let error = self.error.filter(|e| !e.is_null());
        match (self.result, error) {
            (Some(ref result), Some(_)) if !result.is_null() => Err(
                InvocationError::TransportFailure("response carries both result and error".into()),
            ),
            (_, Some(fault)) => Err(InvocationError::RemoteFault(fault)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(InvocationError::TransportFailure(
                "response carries neither result nor error".into(),
            )),
        }
    }
}
