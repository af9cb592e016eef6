//! Proxy factory and invoker: method set, envelopes, settlement.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::MockRemote;
use dubbo_client::{
    ConstructionError, Endpoint, InvocationError, Invoker, ProviderMeta, ProxyFactory, ServiceKey,
    TransportError,
};
use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

fn endpoint() -> Endpoint {
    Endpoint::new("jsonrpc", "10.0.0.5", 20880, "orderService")
}

fn factory(remote: Arc<MockRemote>) -> ProxyFactory {
    ProxyFactory::new(Invoker::new(remote))
}

#[test]
fn method_set_matches_metadata() {
    let factory = factory(MockRemote::returning(Value::Null));
    let key = ServiceKey::new("orderService");
    for methods in [
        vec!["a"],
        vec!["createOrder", "cancelOrder"],
        vec!["x", "y", "z", "w"],
    ] {
        let meta = ProviderMeta::new(endpoint(), methods.clone());
        let proxy = factory.build(meta, &key).unwrap();
        let built: BTreeSet<&str> = proxy.method_names().collect();
        let expected: BTreeSet<&str> = methods.into_iter().collect();
        assert_eq!(built, expected);
        assert!(proxy.methods().all(|m| expected.contains(m.name())));
    }
}

#[test]
fn empty_method_list_builds_nothing() {
    let factory = factory(MockRemote::returning(Value::Null));
    let key = ServiceKey::from_parts("orderService", Some("g"), Some("2.0"));
    let err = factory
        .build(ProviderMeta::new(endpoint(), Vec::<String>::new()), &key)
        .unwrap_err();
    assert_eq!(err, ConstructionError::NoExposedMethods { service: key });
    assert_eq!(err.to_string(), "provider g/orderService:2.0 does not expose any method");
}

#[tokio::test]
async fn envelope_carries_method_and_positional_params() {
    let remote = MockRemote::returning(json!("ok"));
    let invoker = Invoker::new(remote.clone());
    let out = invoker
        .call(&endpoint(), "m", vec![json!("a"), json!({"b": 1})])
        .await
        .unwrap();
    assert_eq!(out, json!("ok"));

    let (_, envelope) = &remote.sent()[0];
    assert_eq!(envelope["jsonrpc"], "2.0");
    assert_eq!(envelope["method"], "m");
    assert_eq!(envelope["params"], json!(["a", {"b": 1}]));
    assert!(envelope["id"].is_u64());
}

#[tokio::test]
async fn concurrent_calls_get_distinct_ids() {
    let remote = MockRemote::new(|req| {
        Ok(serde_json::to_vec(&json!({"jsonrpc": "2.0", "result": req["params"][0], "id": req["id"]})).unwrap())
    });
    let proxy = factory(remote.clone())
        .build(ProviderMeta::new(endpoint(), ["echo"]), &ServiceKey::new("orderService"))
        .unwrap();
    let echo = proxy.method("echo").unwrap();

    let results = join_all((0..16).map(|i| echo.call(vec![json!(i)]))).await;
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!(i));
    }
    let ids: BTreeSet<u64> = remote
        .sent()
        .iter()
        .map(|(_, env)| env["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 16);
}

#[tokio::test]
async fn each_call_settles_exactly_once() {
    let cases: Vec<(Result<Vec<u8>, TransportError>, bool)> = vec![
        (Ok(br#"{"jsonrpc":"2.0","result":1,"id":1}"#.to_vec()), true),
        (Ok(br#"{"jsonrpc":"2.0","error":{"code":1},"id":1}"#.to_vec()), false),
        (Ok(b"<html>".to_vec()), false),
        (Ok(br#"{"jsonrpc":"2.0","result":1,"id":99}"#.to_vec()), false),
        (Err(TransportError::Status(502)), false),
    ];
    for (reply, succeeds) in cases {
        let remote = MockRemote::new(move |_| reply.clone());
        let outcome = Invoker::new(remote).call(&endpoint(), "m", vec![]).await;
        if succeeds {
            assert_ok!(&outcome);
        } else {
            assert_err!(&outcome);
        }
    }
}

#[tokio::test]
async fn transport_errors_become_transport_failures() {
    let remote = MockRemote::new(|_| {
        Err(TransportError::Connect {
            endpoint: "10.0.0.5:20880".into(),
            reason: "connection refused".into(),
        })
    });
    let err = Invoker::new(remote).call(&endpoint(), "m", vec![]).await.unwrap_err();
    match err {
        InvocationError::TransportFailure(cause) => assert!(cause.contains("connection refused")),
        other => panic!("expected TransportFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn proxy_is_reusable_against_its_snapshot() {
    let remote = MockRemote::returning(json!(1));
    let proxy = factory(remote.clone())
        .build(ProviderMeta::new(endpoint(), ["a", "b"]), &ServiceKey::new("orderService"))
        .unwrap();
    for name in ["a", "b", "a"] {
        proxy.method(name).unwrap().call(vec![]).await.unwrap();
    }
    let sent = remote.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|(ep, _)| ep == &endpoint()));
    let methods: Vec<&str> = sent.iter().map(|(_, env)| env["method"].as_str().unwrap()).collect();
    assert_eq!(methods, vec!["a", "b", "a"]);
}
