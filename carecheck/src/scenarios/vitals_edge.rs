//! Vitals edge-case suite
//!
//! Validation errors, extreme and malformed readings, query limits and
//! the all-or-nothing rules of bulk import.

use anyhow::Result;
use chrono::{Duration, Utc};
use futures_util::future::BoxFuture;
use reqwest::Method;
use serde_json::{json, Value};

use super::checks::{expect_status, verify, Shape};
use super::probe::{probe_unauthorized, Protected};
use super::{adopt_session, unique_email};
use crate::harness::Harness;
use crate::report::Verdicts;
use crate::suite::{Suite, TestCase};

/// Most readings a single bulk import may carry
pub const BULK_IMPORT_LIMIT: usize = 100;

/// Longest accepted reading note
pub const NOTES_LIMIT: usize = 500;

/// Largest page the readings listing serves
pub const PAGE_LIMIT: u64 = 100;

pub fn suite() -> Suite {
    Suite {
        name: "vitals-edge",
        title: "🧪 Starting SeniorCare Hub Vitals Edge Case Tests",
        summary_title: "Edge Case Test Results Summary",
        verdicts: Verdicts {
            working_well: "Vitals edge cases handled well!",
            some_issues: "Some edge case issues",
            major_issues: "Major edge case issues",
        },
        cases: vec![
            TestCase::new("Authentication Setup", setup_auth),
            TestCase::new("Vitals Validation Errors", validation_errors),
            TestCase::new("Vitals Edge Cases", edge_cases),
            TestCase::new("Vitals Query Edge Cases", query_edge_cases),
            TestCase::new("Bulk Import Edge Cases", bulk_import_edge_cases),
            TestCase::new("Unauthorized Vitals Access", unauthorized_vitals_access),
        ],
    }
}

fn heart_rate(value: u32) -> Value {
    json!({
        "reading_type": "heart_rate",
        "value": {"value": value},
        "unit": "bpm"
    })
}

fn bulk(readings: Vec<Value>) -> Value {
    json!({
        "device_id": "test_device",
        "device_name": "Test Device",
        "readings": readings
    })
}

fn setup_auth(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Setting up Authentication");

        let email = unique_email("vitals.edge.test");
        let payload = json!({
            "email": email,
            "password": "SecurePassword123!",
            "firstName": "Vitals",
            "lastName": "EdgeTest",
            "role": "senior",
            "phone": "+1-555-0199",
            "dateOfBirth": "1950-06-15"
        });

        let response = h
            .make_request(Method::POST, "/auth/register", Some(&payload))
            .await;
        let Some(body) = verify(
            h,
            "Authentication setup",
            response,
            &[201],
            Shape::All(&["/token", "/user/id"]),
            &format!("Successful for {}", email),
        ) else {
            return Ok(false);
        };

        adopt_session(h, &body)?;
        Ok(true)
    })
}

fn validation_errors(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Vitals Validation Errors");
        if !h.require_credential("validation tests") {
            return Ok(false);
        }

        let mut passed = 0;

        h.step("Testing invalid reading type");
        let invalid_type = json!({
            "reading_type": "invalid_type",
            "value": {"value": 120},
            "unit": "mmHg"
        });
        let response = h
            .make_request(Method::POST, "/vitals", Some(&invalid_type))
            .await;
        if expect_status(
            h,
            "Invalid reading type",
            response.as_ref(),
            &[400],
            "Properly rejected",
        ) {
            passed += 1;
        }

        h.step("Testing missing required fields");
        let incomplete = json!({"reading_type": "heart_rate"});
        let response = h
            .make_request(Method::POST, "/vitals", Some(&incomplete))
            .await;
        if expect_status(
            h,
            "Missing required fields",
            response.as_ref(),
            &[400],
            "Properly rejected",
        ) {
            passed += 1;
        }

        // Accepted but cannot drive abnormal-value detection
        h.step("Testing invalid blood pressure structure");
        let malformed_bp = json!({
            "reading_type": "blood_pressure",
            "value": {"invalid": 120},
            "unit": "mmHg"
        });
        let response = h
            .make_request(Method::POST, "/vitals", Some(&malformed_bp))
            .await;
        match response {
            Some(r) if r.is(&[200, 201]) => {
                h.success("Invalid BP structure - Handled gracefully");
                passed += 1;
            }
            Some(r) => h.warning(format!("Invalid BP structure - Status {}", r.code())),
            None => {}
        }

        Ok(passed >= 2)
    })
}

fn edge_cases(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Vitals Edge Cases");
        if !h.require_credential("edge case tests") {
            return Ok(false);
        }

        let mut passed = 0;

        h.step("Testing extreme vital values");
        let extreme = json!({
            "reading_type": "heart_rate",
            "value": {"value": 200},
            "unit": "bpm",
            "notes": "During intense exercise"
        });
        let response = h.make_request(Method::POST, "/vitals", Some(&extreme)).await;
        if let Some(body) = verify(
            h,
            "Extreme values",
            response,
            &[200, 201],
            Shape::Json,
            "Handled gracefully",
        ) {
            if body["alertCreated"].as_bool() == Some(true) {
                h.info("Extreme values - Alert properly created");
            }
            passed += 1;
        }

        h.step("Testing future timestamp");
        let future = json!({
            "reading_type": "temperature",
            "value": {"value": 37.5},
            "unit": "°C",
            "reading_time": (Utc::now() + Duration::hours(1)).to_rfc3339()
        });
        let response = h.make_request(Method::POST, "/vitals", Some(&future)).await;
        if expect_status(
            h,
            "Future timestamp",
            response.as_ref(),
            &[200, 201],
            "Handled gracefully",
        ) {
            passed += 1;
        }

        h.step("Testing very long notes");
        let long_notes = json!({
            "reading_type": "weight",
            "value": {"value": 70.5},
            "unit": "kg",
            "notes": "A".repeat(NOTES_LIMIT + 100)
        });
        let response = h
            .make_request(Method::POST, "/vitals", Some(&long_notes))
            .await;
        match response {
            Some(r) if r.is(&[400]) => {
                h.success("Long notes - Properly rejected");
                passed += 1;
            }
            Some(r) if r.is(&[200, 201]) => {
                h.warning("Long notes - Accepted (might be truncated)");
                passed += 1;
            }
            Some(r) => h.failure(format!("Long notes - Unexpected status {}", r.code())),
            None => {}
        }

        Ok(passed >= 2)
    })
}

fn query_edge_cases(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Vitals Query Edge Cases");
        if !h.require_credential("query edge case tests") {
            return Ok(false);
        }

        let mut passed = 0;

        h.step("Testing invalid date range");
        let response = h
            .make_request(
                Method::GET,
                "/vitals?start_date=invalid-date&end_date=2024-01-01",
                None,
            )
            .await;
        if expect_status(
            h,
            "Invalid date range",
            response.as_ref(),
            &[200, 400],
            "Handled gracefully",
        ) {
            passed += 1;
        }

        h.step("Testing very large page size");
        let response = h
            .make_request(Method::GET, "/vitals?limit=10000", None)
            .await;
        if let Some(body) = verify(
            h,
            "Large page size",
            response,
            &[200],
            Shape::Json,
            "Handled gracefully",
        ) {
            if let Some(limit) = body.pointer("/pagination/limit").and_then(Value::as_u64) {
                if limit <= PAGE_LIMIT {
                    h.info(format!("Large page size - Limit capped at {}", limit));
                } else {
                    h.warning(format!("Large page size - Limit not capped ({})", limit));
                }
            }
            passed += 1;
        }

        h.step("Testing invalid reading type in trends");
        let response = h
            .make_request(Method::GET, "/vitals/trends/invalid_type", None)
            .await;
        if expect_status(
            h,
            "Invalid trends type",
            response.as_ref(),
            &[200, 404],
            "Handled gracefully",
        ) {
            passed += 1;
        }

        Ok(passed >= 2)
    })
}

fn bulk_import_edge_cases(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Bulk Import Edge Cases");
        if !h.require_credential("bulk import edge case tests") {
            return Ok(false);
        }

        let mut passed = 0;

        h.step("Testing empty readings array");
        let response = h
            .make_request(Method::POST, "/vitals/bulk-import", Some(&bulk(Vec::new())))
            .await;
        if expect_status(
            h,
            "Empty readings array",
            response.as_ref(),
            &[400],
            "Properly rejected",
        ) {
            passed += 1;
        }

        h.step("Testing too many readings");
        let oversized: Vec<Value> = (0..=BULK_IMPORT_LIMIT as u32)
            .map(|i| heart_rate(70 + i % 20))
            .collect();
        let response = h
            .make_request(Method::POST, "/vitals/bulk-import", Some(&bulk(oversized)))
            .await;
        if expect_status(h, "Too many readings", response.as_ref(), &[400], "Properly rejected") {
            passed += 1;
        }

        h.step("Testing mixed valid/invalid readings");
        let mixed = vec![
            heart_rate(75),
            json!({
                "reading_type": "invalid_type",
                "value": {"value": 100},
                "unit": "invalid"
            }),
        ];
        let response = h
            .make_request(Method::POST, "/vitals/bulk-import", Some(&bulk(mixed)))
            .await;
        if expect_status(h, "Mixed readings", response.as_ref(), &[400], "Properly rejected") {
            passed += 1;
        }

        Ok(passed >= 2)
    })
}

fn unauthorized_vitals_access(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Unauthorized Vitals Access");

        let endpoints = [
            Protected::get("/vitals"),
            Protected::post("/vitals", heart_rate(75)),
            Protected::get("/vitals/latest"),
            Protected::get("/vitals/trends/heart_rate"),
            Protected::get("/vitals/summary"),
            Protected::post("/vitals/bulk-import", heart_rate(75)),
        ];
        Ok(probe_unauthorized(h, "Unauthorized vitals access", &endpoints).await)
    })
}
