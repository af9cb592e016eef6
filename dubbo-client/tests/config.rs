//! Registry configuration as callers write it.

use std::time::Duration;

use dubbo_client::{AppIdentity, RegistryConfig, ZkOptions};
use serde_json::json;

#[test]
fn reads_camel_case_millis() {
    let config: RegistryConfig = serde_json::from_value(json!({
        "zk": {"sessionTimeout": 5000, "spinDelay": 250, "retries": 3},
        "app": {"application": "shop", "owner": "team-a", "port": 8080}
    }))
    .unwrap();
    assert_eq!(config.zk.session_timeout, Duration::from_secs(5));
    assert_eq!(config.zk.spin_delay, Duration::from_millis(250));
    assert_eq!(config.zk.retries, 3);
    assert_eq!(config.zk.attempts(), 4);
    assert_eq!(config.app.application.as_deref(), Some("shop"));

    let params: Vec<(&str, String)> = config.app.url_parameters().collect();
    assert_eq!(params, vec![("owner", "team-a".to_owned()), ("port", "8080".to_owned())]);
}

#[test]
fn everything_is_optional() {
    let config: RegistryConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(config, RegistryConfig::default());
    assert_eq!(config.zk, ZkOptions::default());
    assert_eq!(config.zk.session_timeout, Duration::from_millis(30_000));
    assert_eq!(config.zk.spin_delay, Duration::from_millis(1_000));
    assert_eq!(config.zk.attempts(), 1);
    assert_eq!(config.app, AppIdentity::default());

    let partial: RegistryConfig = serde_json::from_value(json!({"zk": {"retries": 2}})).unwrap();
    assert_eq!(partial.zk.retries, 2);
    assert_eq!(partial.zk.session_timeout, Duration::from_millis(30_000));
}

#[test]
fn writes_back_the_same_shape() {
    let config = RegistryConfig::default().with_app(AppIdentity::new("shop"));
    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(
        value,
        json!({
            "zk": {"sessionTimeout": 30000, "spinDelay": 1000, "retries": 0},
            "app": {"application": "shop"}
        })
    );
}
