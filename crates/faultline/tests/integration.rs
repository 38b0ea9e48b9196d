// Copyright 2026 Faultline Dev
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the Faultline HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use faultline_api::create_router;
use faultline_core::Config;
use faultline_engine::{ErrorInjector, RuleEngine, RuleStore, StatsStore};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance.
struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    async fn start_with(config: Config) -> Self {
        let store = Arc::new(RuleStore::new());
        let engine = Arc::new(RuleEngine::new());
        let stats = Arc::new(StatsStore::new(
            config.engine.stats_capacity,
            config.engine.stat_retention_hours,
        ));
        let injector = Arc::new(ErrorInjector::new(config, store, engine, stats));

        // log_requests disabled for tests
        let app = create_router(injector, false);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        Self {
            addr,
            client: reqwest::Client::new(),
            _handle: handle,
            _shutdown_tx: shutdown_tx,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn post_rule(&self, rule: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/errors/rules"))
            .json(rule)
            .send()
            .await
            .expect("request failed")
    }
}

fn always_http_rule(name: &str, service: &str) -> Value {
    json!({
        "name": name,
        "service": service,
        "action": {"type": "httpError", "code": 503, "message": "injected"},
        "conditions": [{"type": "probability", "operator": "eq", "value": 1.0}]
    })
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;

    let response =
        server.client.get(server.url("/health")).send().await.expect("request failed");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "faultline");
    assert_eq!(body["config"]["max_rules"], 100);
    assert_eq!(body["config"]["enable_network_errors"], true);
}

#[tokio::test]
async fn test_rule_crud_roundtrip() {
    let server = TestServer::start().await;

    // Create
    let response = server.post_rule(&always_http_rule("crud rule", "storage-service")).await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["name"], "crud rule");
    assert_eq!(created["trigger_count"], 0);

    // Get
    let response = server
        .client
        .get(server.url(&format!("/errors/rules/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["name"], "crud rule");
    assert_eq!(fetched["action"]["type"], "httpError");

    // Update
    let mut updated = always_http_rule("crud rule renamed", "storage-service");
    updated["priority"] = json!(5);
    let response = server
        .client
        .put(server.url(&format!("/errors/rules/{id}")))
        .json(&updated)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "crud rule renamed");
    assert_eq!(body["priority"], 5);

    // List
    let response = server.client.get(server.url("/errors/rules")).send().await.unwrap();
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["count"], 1);
    assert_eq!(list["rules"][0]["id"], id.as_str());

    // Delete
    let response = server
        .client
        .delete(server.url(&format!("/errors/rules/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = server
        .client
        .get(server.url(&format!("/errors/rules/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_validation_rejection() {
    let server = TestServer::start().await;

    let bad = json!({
        "name": "bad code",
        "service": "storage-service",
        "action": {"type": "httpError", "code": 200, "message": "not an error"}
    });
    let response = server.post_rule(&bad).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "ValidationError");

    // The rejected rule is absent from the listing.
    let response = server.client.get(server.url("/errors/rules")).send().await.unwrap();
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_capacity_error() {
    let mut config = Config::default();
    config.engine.max_rules = 2;
    let server = TestServer::start_with(config).await;

    for i in 0..2 {
        let response =
            server.post_rule(&always_http_rule(&format!("rule-{i}"), "storage-service")).await;
        assert_eq!(response.status(), 201);
    }

    let response = server.post_rule(&always_http_rule("overflow", "storage-service")).await;
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "CapacityError");

    let response = server.client.get(server.url("/errors/rules")).send().await.unwrap();
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["count"], 2);
}

#[tokio::test]
async fn test_should_inject_flow() {
    let server = TestServer::start().await;
    server.post_rule(&always_http_rule("always", "storage-service")).await;

    let response = server
        .client
        .post(server.url("/errors/should-inject"))
        .json(&json!({"service": "storage-service", "operation": "PutObject"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["matched"], true);
    assert_eq!(body["action"]["type"], "httpError");
    assert_eq!(body["action"]["code"], 503);

    // No rule targets this service.
    let response = server
        .client
        .post(server.url("/errors/should-inject"))
        .json(&json!({"service": "metadata-service", "operation": "GetMetadata"}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["matched"], false);
    assert!(body.get("action").is_none());
}

#[tokio::test]
async fn test_inject_network_error_shape() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/errors/inject"))
        .json(&json!({"action": {"type": "networkError", "message": "connection reset"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "NetworkErrorInjected");
    assert_eq!(body["message"], "network error injected: connection reset");
}

#[tokio::test]
async fn test_inject_disabled_category_is_noop() {
    let mut config = Config::default();
    config.injection.enable_network_errors = false;
    let server = TestServer::start_with(config).await;

    let response = server
        .client
        .post(server.url("/errors/inject"))
        .json(&json!({"action": {"type": "networkError", "message": "connection reset"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_inject_http_error_is_noop() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/errors/inject"))
        .json(&json!({"action": {"type": "httpError", "code": 500, "message": "x"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_stats_flow() {
    let server = TestServer::start().await;
    server.post_rule(&always_http_rule("always", "storage-service")).await;

    for _ in 0..3 {
        server
            .client
            .post(server.url("/errors/should-inject"))
            .json(&json!({"service": "storage-service", "operation": "PutObject"}))
            .send()
            .await
            .unwrap();
    }

    // Give the statistics worker a moment to drain the queue.
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    let response = server.client.get(server.url("/errors/stats")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["total_events"], 3);
    assert_eq!(stats["events_by_service"]["storage-service"], 3);
    assert_eq!(stats["events_by_action"]["httpError"], 3);
    assert_eq!(stats["total_rules"], 1);
    assert_eq!(stats["active_rules"], 1);

    // Reset
    let response = server.client.delete(server.url("/errors/stats")).send().await.unwrap();
    assert_eq!(response.status(), 204);

    let response = server.client.get(server.url("/errors/stats")).send().await.unwrap();
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["total_events"], 0);
    assert_eq!(stats["total_rules"], 1);
}

#[tokio::test]
async fn test_unknown_action_type_rejected_at_parse() {
    let server = TestServer::start().await;

    let bad = json!({
        "name": "mystery",
        "service": "storage-service",
        "action": {"type": "meltdown", "message": "nope"}
    });
    let response = server.post_rule(&bad).await;
    // Unknown action kinds fail JSON deserialization.
    assert_eq!(response.status(), 422);
}
