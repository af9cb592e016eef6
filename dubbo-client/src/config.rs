//! Registry configuration, shaped like `{"zk": {"sessionTimeout", "spinDelay", "retries"}, "app": {...}}`.
//! Durations are integer milliseconds on the wire.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_SPIN_DELAY: Duration = Duration::from_millis(1_000);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub zk: ZkOptions,
    pub app: AppIdentity,
}

impl RegistryConfig {
    pub fn with_zk(mut self, zk: ZkOptions) -> Self {
        self.zk = zk;
        self
    }

    pub fn with_app(mut self, app: AppIdentity) -> Self {
        self.app = app;
        self
    }
}

/// Coordination-service session and retry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZkOptions {
    /// Upper bound on a single registry round trip.
    #[serde(with = "millis")]
    pub session_timeout: Duration,
    /// Pause between attempts.
    #[serde(with = "millis")]
    pub spin_delay: Duration,
    /// Attempts after the first; 0 means one attempt only.
    pub retries: u32,
}

impl ZkOptions {
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for ZkOptions {
    fn default() -> Self {
        Self {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            spin_delay: DEFAULT_SPIN_DELAY,
            retries: 0,
        }
    }
}

/// Identity this client registers as a consumer with. Without `application` no consumer node is written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Any other identity fields (owner, organization, environment, ...), copied onto the consumer URL.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AppIdentity {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: Some(application.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_owned(), value.into());
        self
    }

    /// Extra fields as URL parameters; strings verbatim, other scalars as JSON text, nulls dropped.
    pub fn url_parameters(&self) -> impl Iterator<Item = (&str, String)> {
        self.extra.iter().filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k.as_str(), s.clone())),
            other => Some((k.as_str(), other.to_string())),
        })
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
