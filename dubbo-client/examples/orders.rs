//! Example: call `createOrder` on an order service published in the registry.
//!
//! The provider node is published into an in-process store so the example runs without ZooKeeper;
//! point it at a JSON-RPC server with `cargo run --example orders -- 127.0.0.1:8080`.
//! `RUST_LOG=dubbo_client=debug` shows the resolve/build/call steps.

use std::sync::Arc;
use std::time::Duration;

use dubbo_client::{AppIdentity, DubboClient, HttpTransport, MemoryStore, RegistryConfig};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provider = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:8080".to_owned());
    let store = MemoryStore::new();
    store.add_provider(
        "/dubbo",
        "com.acme.OrderService",
        &format!(
            "jsonrpc://{}/com.acme.OrderService?application=orders&methods=createOrder,cancelOrder&version=1.0",
            provider
        ),
    );

    let mut client = DubboClient::new()
        .store(Arc::new(store))
        .transport(Arc::new(HttpTransport::new().with_timeout(Duration::from_secs(5))));
    client.registry(
        "zookeeper://127.0.0.1:2181",
        RegistryConfig::default().with_app(AppIdentity::new("order-example")),
    )?;

    let orders = client
        .get_provider("com.acme.OrderService", None, Some("1.0"))
        .await?;
    println!("{} exposes:", orders.endpoint());
    for name in orders.method_names() {
        println!("  {}", name);
    }

    if let Some(create) = orders.method("createOrder") {
        match create.call(vec![json!(42)]).await {
            Ok(order) => println!("createOrder(42) -> {}", order),
            Err(e) => println!("createOrder(42) failed: {}", e),
        }
    }
    Ok(())
}
