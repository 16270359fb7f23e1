mod common;

use common::{FailingCache, InMemoryLinks, SlowCache, TestApp};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["stats_queue"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["message"], "memory connected");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let app = TestApp::new();

    let json = app.server.get("/health").await.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json.get("checks").is_some());
    assert!(json["checks"].get("database").is_some());
    assert!(json["checks"].get("stats_queue").is_some());
    assert!(json["checks"].get("cache").is_some());
}

#[tokio::test]
async fn test_health_unhealthy_when_store_down() {
    let links = InMemoryLinks::new();
    links.fail_lookups();
    let app = TestApp::with(links, Arc::new(linkhop::infrastructure::cache::NullCache::new()));

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checks"]["database"]["status"], "error");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_stays_up_when_cache_down() {
    let app = TestApp::with(InMemoryLinks::new(), Arc::new(FailingCache));

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["cache"]["status"], "degraded");
    assert_eq!(json["checks"]["cache"]["message"], "failing connection failed");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["stats_queue"]["status"], "ok");
}

#[tokio::test]
async fn test_health_does_not_wait_on_hung_cache() {
    let cache = SlowCache {
        delay: Duration::from_secs(5),
        stale_url: "https://stale.example".to_string(),
    };
    let app = TestApp::with(InMemoryLinks::new(), Arc::new(cache));

    let started = std::time::Instant::now();
    let response = app.server.get("/health").await;

    assert!(started.elapsed() < Duration::from_secs(2));
    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["cache"]["status"], "degraded");
    assert_eq!(json["checks"]["cache"]["message"], "slow did not answer within 50ms");
}

#[tokio::test]
async fn test_health_unhealthy_after_stats_worker_stopped() {
    let mut app = TestApp::new();
    app.flush_stats().await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checks"]["stats_queue"]["status"], "error");
}
