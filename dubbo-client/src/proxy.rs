//! Proxy factory: one callable per method the provider exposes, bound to its endpoint.

use std::collections::BTreeMap;
use std::fmt;

use dubbo_client_core::{ConstructionError, Endpoint, InvocationError, ProviderMeta, ServiceKey};
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::rpc::Invoker;

/// Future returned by a remote method; resolves to the remote `result` or an invocation error.
pub type MethodFuture = BoxFuture<'static, Result<Value, InvocationError>>;

/// Bound remote method: positional args in, invoker future out.
pub type MethodFn = Box<dyn Fn(Vec<Value>) -> MethodFuture + Send + Sync>;

pub struct RemoteMethod {
    name: String,
    call: MethodFn,
}

impl RemoteMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke remotely. Arity and types are the provider's business.
    pub fn call(&self, args: Vec<Value>) -> MethodFuture {
        (self.call)(args)
    }
}

impl fmt::Debug for RemoteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMethod").field("name", &self.name).finish()
    }
}

/// Callable view of one provider, fixed at construction. Never re-resolves.
#[derive(Debug)]
pub struct Proxy {
    service: ServiceKey,
    endpoint: Endpoint,
    methods: BTreeMap<String, RemoteMethod>,
}

impl Proxy {
    pub fn service(&self) -> &ServiceKey {
        &self.service
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The bound method, if the provider exposes `name`.
    pub fn method(&self, name: &str) -> Option<&RemoteMethod> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = &RemoteMethod> {
        self.methods.values()
    }
}

#[derive(Clone, Default)]
pub struct ProxyFactory {
    invoker: Invoker,
}

impl ProxyFactory {
    pub fn new(invoker: Invoker) -> Self {
        Self { invoker }
    }

    /// Bind every exposed method of `meta`. A provider exposing nothing is rejected.
    pub fn build(
        &self,
        meta: ProviderMeta,
        service: &ServiceKey,
    ) -> Result<Proxy, ConstructionError> {
        if meta.methods.is_empty() {
            return Err(ConstructionError::NoExposedMethods {
                service: service.clone(),
            });
        }
        let methods = meta
            .methods
            .iter()
            .map(|name| (name.clone(), self.bind(&meta.endpoint, name)))
            .collect();
        Ok(Proxy {
            service: service.clone(),
            endpoint: meta.endpoint,
            methods,
        })
    }

    fn bind(&self, endpoint: &Endpoint, name: &str) -> RemoteMethod {
        let invoker = self.invoker.clone();
        let endpoint = endpoint.clone();
        let method = name.to_owned();
        let call: MethodFn = Box::new(move |args: Vec<Value>| {
            let invoker = invoker.clone();
            let endpoint = endpoint.clone();
            let method = method.clone();
            Box::pin(async move { invoker.call(&endpoint, &method, args).await })
        });
        RemoteMethod {
            name: name.to_owned(),
            call,
        }
    }
}
