//! Vitals edge-case scenarios

use carecheck::scenarios::vitals_edge::{self, BULK_IMPORT_LIMIT};
use carecheck::UnauthorizedPolicy;
use reqwest::Method;
use serde_json::{json, Value};

use crate::harness::{StubOptions, StubServer};

fn heart_rate(value: u32) -> Value {
    json!({
        "reading_type": "heart_rate",
        "value": {"value": value},
        "unit": "bpm"
    })
}

/// Test: Every edge case is handled by a conforming API
#[tokio::test]
async fn test_vitals_edge_suite_clean() {
    let server = StubServer::start().await.expect("Failed to start server");
    let mut h = server.harness();

    let summary = h.run(&vitals_edge::suite()).await;

    assert_eq!(summary.failed, 0, "failures: {:?}", summary.failures);
    assert_eq!(summary.passed, 14);
    // The credential is back after the anonymous auth check
    assert!(h.credential().is_some());
}

/// Test: Bulk import is all or nothing
#[tokio::test]
async fn test_bulk_import_rejections_store_nothing() {
    let server = StubServer::start().await.expect("Failed to start server");
    let mut h = server.harness();

    let resp = h
        .make_request(
            Method::POST,
            "/auth/register",
            Some(&json!({"email": "bulk@example.com", "password": "pw"})),
        )
        .await
        .unwrap();
    let token = resp.json().unwrap()["token"].as_str().unwrap().to_string();
    h.set_credential(Some(token));

    let oversized: Vec<Value> = (0..=BULK_IMPORT_LIMIT as u32)
        .map(|i| heart_rate(60 + i % 30))
        .collect();
    let mixed = vec![
        heart_rate(75),
        json!({"reading_type": "invalid_type", "value": {"value": 1}, "unit": "x"}),
    ];

    for readings in [Vec::new(), oversized, mixed] {
        let batch = json!({"device_id": "d1", "readings": readings});
        let resp = h
            .make_request(Method::POST, "/vitals/bulk-import", Some(&batch))
            .await
            .unwrap();
        assert_eq!(resp.code(), 400);
    }
    assert_eq!(server.state().reading_count(), 0);

    let batch = json!({"device_id": "d1", "readings": [heart_rate(70), heart_rate(72)]});
    let resp = h
        .make_request(Method::POST, "/vitals/bulk-import", Some(&batch))
        .await
        .unwrap();
    assert_eq!(resp.code(), 201);
    assert_eq!(resp.json().unwrap()["imported"], 2);
    assert_eq!(server.state().reading_count(), 2);
}

/// Test: Abnormal heart rate raises an alert
#[tokio::test]
async fn test_abnormal_reading_creates_alert() {
    let server = StubServer::start().await.expect("Failed to start server");
    let mut h = server.harness();

    let resp = h
        .make_request(
            Method::POST,
            "/auth/register",
            Some(&json!({"email": "alert@example.com", "password": "pw"})),
        )
        .await
        .unwrap();
    let token = resp.json().unwrap()["token"].as_str().unwrap().to_string();
    h.set_credential(Some(token));

    let resp = h
        .make_request(Method::POST, "/vitals", Some(&heart_rate(150)))
        .await
        .unwrap();
    assert_eq!(resp.code(), 201);
    assert_eq!(resp.json().unwrap()["alertCreated"], true);
}

/// Test: Without a credential every later case is skipped, not failed
#[tokio::test]
async fn test_failed_setup_skips_authenticated_cases() {
    let server = StubServer::start().await.expect("Failed to start server");
    let mut h = server.harness();

    // Run everything but the setup case
    let mut suite = vitals_edge::suite();
    suite.cases.remove(0);
    let summary = h.run(&suite).await;

    // Only the auth check logs anything
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 0);
}

/// Test: Strict policy fails every open vitals endpoint
#[tokio::test]
async fn test_strict_auth_check_on_open_vitals() {
    let server = StubServer::start_with(StubOptions {
        enforce_auth: false,
        ..StubOptions::default()
    })
    .await
    .expect("Failed to start server");
    let config = server.config_with_policy(UnauthorizedPolicy::Strict);
    let mut h = carecheck::Harness::new(config).unwrap();

    let summary = h.run(&vitals_edge::suite()).await;

    // Six open endpoints plus the verdict
    assert_eq!(summary.failed, 7, "failures: {:?}", summary.failures);
    assert_eq!(
        summary.failures.last().map(String::as_str),
        Some("Unauthorized vitals access - Only 0/6 endpoints properly secured")
    );
}
