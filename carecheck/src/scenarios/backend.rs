//! Backend suite - walks every product area in dependency order
//!
//! Registration provides the credential that profile, dashboard,
//! check-ins, medications, family, messaging, emergency, vitals and
//! premium rely on; logout runs last and drops it.

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::BoxFuture;
use reqwest::Method;
use serde_json::json;

use super::checks::{verify, verify_reachable, Shape};
use super::probe::{probe_unauthorized, Protected};
use super::{adopt_session, id_string, unique_email};
use crate::config::{Config, VitalsDepth};
use crate::harness::Harness;
use crate::report::Verdicts;
use crate::suite::{CaseFn, Suite, TestCase};

/// Build the backend suite; the vitals case follows `config.vitals_depth`
pub fn suite(config: &Config) -> Suite {
    let vitals: CaseFn = match config.vitals_depth {
        VitalsDepth::Comprehensive => vitals_comprehensive,
        VitalsDepth::Basic => vitals_basic,
    };

    Suite {
        name: "backend",
        title: "🚀 Starting SeniorCare Hub Backend API Tests",
        summary_title: "Test Results Summary",
        verdicts: Verdicts {
            working_well: "Backend is working well!",
            some_issues: "Backend has some issues",
            major_issues: "Backend has major issues",
        },
        cases: vec![
            TestCase::new("Health Check", health_check),
            TestCase::new("User Registration", user_registration),
            TestCase::new("User Login", user_login),
            TestCase::new("User Profile", user_profile),
            TestCase::new("Dashboard Data", dashboard_data),
            TestCase::new("Daily Check-in", daily_checkin),
            TestCase::new("Check-in History", checkin_history),
            TestCase::new("Medication Management", medication_management),
            TestCase::new("Family Connections", family_connections),
            TestCase::new("Messaging Endpoints", messaging_endpoints),
            TestCase::new("Emergency Alerts", emergency_alerts),
            TestCase::new("Vitals Endpoints", vitals),
            TestCase::new("Premium Features", premium_features),
            TestCase::new("Unauthorized Access", unauthorized_access),
            TestCase::new("User Logout", user_logout),
        ],
    }
}

fn health_check(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Health Endpoint");

        let response = h.make_request(Method::GET, "/health", None).await;
        let body = verify(
            h,
            "Health endpoint",
            response,
            &[200],
            Shape::Field("/status", "healthy"),
            "Server is healthy",
        );
        Ok(body.is_some())
    })
}

fn user_registration(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing User Registration");

        let email = unique_email("senior.test");
        let payload = json!({
            "email": email,
            "password": "SecurePassword123!",
            "firstName": "Margaret",
            "lastName": "Johnson",
            "role": "senior",
            "phone": "+1-555-0123",
            "dateOfBirth": "1945-03-15",
            "emergencyContacts": [{
                "name": "Robert Johnson",
                "phone": "+1-555-0124",
                "relationship": "Son",
                "isPrimary": true
            }]
        });

        let response = h
            .make_request(Method::POST, "/auth/register", Some(&payload))
            .await;
        let Some(body) = verify(
            h,
            "User registration",
            response,
            &[201],
            Shape::All(&["/token", "/user/id"]),
            &format!("Success for {}", email),
        ) else {
            return Ok(false);
        };

        adopt_session(h, &body)?;
        Ok(true)
    })
}

fn user_login(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing User Login");

        if h.user_id().is_none() {
            h.warning("Skipping login test - no registered user");
            return Ok(false);
        }

        // Fresh account so the login does not depend on registration timing
        let email = unique_email("login.test");
        let registration = json!({
            "email": email,
            "password": "LoginTest123!",
            "firstName": "Login",
            "lastName": "Test",
            "role": "senior",
            "phone": "+1-555-0125",
            "dateOfBirth": "1950-05-20"
        });

        let created = h
            .make_request(Method::POST, "/auth/register", Some(&registration))
            .await;
        if !created.is_some_and(|r| r.code() == 201) {
            h.failure("Login test - Failed to create test user for login");
            return Ok(false);
        }

        let login = json!({
            "email": email,
            "password": "LoginTest123!",
            "rememberMe": false
        });

        let mut scope = h.anonymous();
        let response = scope
            .make_request(Method::POST, "/auth/login", Some(&login))
            .await;
        let Some(body) = verify(
            &mut scope,
            "User login",
            response,
            &[200],
            Shape::All(&["/token", "/user"]),
            "Success",
        ) else {
            return Ok(false);
        };

        let token = body["token"]
            .as_str()
            .context("login token is not a string")?;
        scope.keep(token.to_string());
        Ok(true)
    })
}

fn user_profile(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing User Profile");
        if !h.require_credential("profile test") {
            return Ok(false);
        }

        let response = h.make_request(Method::GET, "/auth/profile", None).await;
        let body = verify(
            h,
            "User profile",
            response,
            &[200],
            Shape::All(&["/user/id", "/user/email"]),
            "Retrieved successfully",
        );
        Ok(body.is_some())
    })
}

fn dashboard_data(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Dashboard Data");
        if !h.require_credential("dashboard test") {
            return Ok(false);
        }

        let response = h.make_request(Method::GET, "/dashboard", None).await;
        let body = verify(
            h,
            "Dashboard data",
            response,
            &[200],
            Shape::All(&["/user"]),
            "Retrieved successfully",
        );
        Ok(body.is_some())
    })
}

fn daily_checkin(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Daily Check-in");
        if !h.require_credential("check-in test") {
            return Ok(false);
        }

        let payload = json!({
            "mood_rating": 4,
            "energy_level": 3,
            "pain_level": 2,
            "sleep_quality": 4,
            "appetite_rating": 4,
            "hydration_glasses": 6,
            "medications_taken": true,
            "exercise_minutes": 30,
            "social_interaction": true,
            "notes": "Feeling good today! Had a nice walk in the park."
        });

        let response = h
            .make_request(Method::POST, "/checkins", Some(&payload))
            .await;
        let body = verify(
            h,
            "Daily check-in",
            response,
            &[200, 201],
            Shape::Any(&["/checkIn", "/message"]),
            "Created successfully",
        );
        Ok(body.is_some())
    })
}

fn checkin_history(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Check-in History");
        if !h.require_credential("check-in history test") {
            return Ok(false);
        }

        let response = h.make_request(Method::GET, "/checkins", None).await;
        let body = verify(
            h,
            "Check-in history",
            response,
            &[200],
            Shape::All(&["/checkIns"]),
            "Retrieved successfully",
        );
        Ok(body.is_some())
    })
}

fn medication_management(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Medication Management");
        if !h.require_credential("medication test") {
            return Ok(false);
        }

        let medication = json!({
            "name": "Lisinopril",
            "dosage": "10mg",
            "frequency": "daily",
            "times": ["08:00"],
            "instructions": "Take with food",
            "prescriber_name": "Dr. Smith",
            "prescription_number": "RX123456",
            "refills_remaining": 3,
            "side_effects": "May cause dizziness",
            "start_date": "2024-01-01"
        });

        let response = h
            .make_request(Method::POST, "/medications", Some(&medication))
            .await;
        let created = verify(
            h,
            "Medication creation",
            response,
            &[200, 201],
            Shape::Any(&["/medication", "/message"]),
            "Success",
        )
        .is_some();

        let response = h.make_request(Method::GET, "/medications", None).await;
        let listed = verify(
            h,
            "Medication list",
            response,
            &[200],
            Shape::All(&["/medications"]),
            "Retrieved successfully",
        )
        .is_some();

        Ok(listed || created)
    })
}

fn family_connections(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Family Connections");
        if !h.require_credential("family connections test") {
            return Ok(false);
        }

        // Either key is accepted and an empty list is valid
        let response = h
            .make_request(Method::GET, "/users/family-connections", None)
            .await;
        let body = verify(
            h,
            "Family connections",
            response,
            &[200],
            Shape::Any(&["/connections", "/familyConnections"]),
            "Retrieved successfully",
        );
        Ok(body.is_some())
    })
}

fn messaging_endpoints(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Messaging Endpoints");
        if !h.require_credential("messaging test") {
            return Ok(false);
        }

        let response = h.make_request(Method::GET, "/messaging", None).await;
        Ok(verify_reachable(h, "Messaging endpoints", response, "Accessible"))
    })
}

fn emergency_alerts(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Emergency Alerts");
        if !h.require_credential("emergency alerts test") {
            return Ok(false);
        }

        let alert = json!({
            "alert_type": "medical",
            "severity": "high",
            "message": "Feeling chest pain",
            "location": "Home"
        });

        let response = h
            .make_request(Method::POST, "/emergency", Some(&alert))
            .await;
        Ok(verify_reachable(
            h,
            "Emergency alerts",
            response,
            "Endpoint accessible",
        ))
    })
}

fn vitals_comprehensive(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Vitals Endpoints (Comprehensive)");
        if !h.require_credential("vitals test") {
            return Ok(false);
        }

        let mut all_ok = true;

        h.step("Testing POST /api/vitals - Create vital reading");
        let reading = json!({
            "reading_type": "blood_pressure",
            "value": {"systolic": 120, "diastolic": 80},
            "unit": "mmHg",
            "device_name": "Omron BP Monitor",
            "notes": "Morning reading after breakfast"
        });
        let response = h.make_request(Method::POST, "/vitals", Some(&reading)).await;
        let created = verify(
            h,
            "POST /api/vitals",
            response,
            &[200, 201],
            Shape::All(&["/reading/id"]),
            "Vital reading created successfully",
        );
        all_ok &= created.is_some();
        let reading_id = created
            .as_ref()
            .and_then(|body| body.pointer("/reading/id"))
            .map(id_string);

        h.step("Testing POST /api/vitals - Abnormal reading (alert system)");
        let abnormal = json!({
            "reading_type": "heart_rate",
            "value": {"value": 150},
            "unit": "bpm",
            "device_name": "Fitbit Charge 5",
            "notes": "Felt dizzy during reading"
        });
        let response = h.make_request(Method::POST, "/vitals", Some(&abnormal)).await;
        match verify(
            h,
            "POST /api/vitals (abnormal)",
            response,
            &[200, 201],
            Shape::Json,
            "Abnormal reading created",
        ) {
            Some(body) => {
                if body["alertCreated"].as_bool() == Some(true) {
                    h.info("Abnormal reading detected and alert created");
                }
            }
            None => all_ok = false,
        }

        h.step("Testing GET /api/vitals - Retrieve vital readings");
        let response = h.make_request(Method::GET, "/vitals", None).await;
        all_ok &= verify(
            h,
            "GET /api/vitals",
            response,
            &[200],
            Shape::All(&["/readings", "/pagination"]),
            "Vital readings retrieved successfully",
        )
        .is_some();

        h.step("Testing GET /api/vitals - With filtering");
        let response = h
            .make_request(Method::GET, "/vitals?reading_type=blood_pressure&limit=10", None)
            .await;
        all_ok &= verify(
            h,
            "GET /api/vitals (filtered)",
            response,
            &[200],
            Shape::All(&["/readings"]),
            "Filtering and pagination working",
        )
        .is_some();

        h.step("Testing GET /api/vitals/latest - Latest readings");
        let response = h.make_request(Method::GET, "/vitals/latest", None).await;
        all_ok &= verify(
            h,
            "GET /api/vitals/latest",
            response,
            &[200],
            Shape::All(&["/latestReadings"]),
            "Latest readings retrieved successfully",
        )
        .is_some();

        h.step("Testing GET /api/vitals/trends/heart_rate - Trend data");
        let response = h
            .make_request(Method::GET, "/vitals/trends/heart_rate?days=7", None)
            .await;
        all_ok &= verify(
            h,
            "GET /api/vitals/trends",
            response,
            &[200],
            Shape::All(&["/trendData", "/statistics"]),
            "Trend data retrieved successfully",
        )
        .is_some();

        h.step("Testing GET /api/vitals/summary - Summary statistics");
        let response = h
            .make_request(Method::GET, "/vitals/summary?days=30", None)
            .await;
        all_ok &= verify(
            h,
            "GET /api/vitals/summary",
            response,
            &[200],
            Shape::All(&["/summary", "/timeRange"]),
            "Summary statistics retrieved successfully",
        )
        .is_some();

        h.step("Testing POST /api/vitals/bulk-import - Bulk import");
        let now = Utc::now().to_rfc3339();
        let batch = json!({
            "device_id": "fitbit_001",
            "device_name": "Fitbit Versa 3",
            "readings": [
                {
                    "reading_type": "heart_rate",
                    "value": {"value": 72},
                    "unit": "bpm",
                    "reading_time": now,
                    "notes": "Resting heart rate"
                },
                {
                    "reading_type": "oxygen_saturation",
                    "value": {"value": 98},
                    "unit": "%",
                    "reading_time": now,
                    "notes": "Normal oxygen level"
                }
            ]
        });
        let response = h
            .make_request(Method::POST, "/vitals/bulk-import", Some(&batch))
            .await;
        all_ok &= verify(
            h,
            "POST /api/vitals/bulk-import",
            response,
            &[200, 201],
            Shape::All(&["/imported", "/deviceId"]),
            "Bulk import successful",
        )
        .is_some();

        let Some(id) = reading_id else {
            h.warning("DELETE /api/vitals/:id - Skipped (no vital reading ID available)");
            return Ok(all_ok);
        };

        h.step(&format!("Testing DELETE /api/vitals/{} - Delete vital reading", id));
        let response = h
            .make_request(Method::DELETE, &format!("/vitals/{}", id), None)
            .await;
        let deleted = verify(
            h,
            "DELETE /api/vitals/:id",
            response,
            &[200],
            Shape::All(&["/message"]),
            "Vital reading deleted successfully",
        )
        .is_some();
        all_ok &= deleted;

        if deleted {
            all_ok &= confirm_deleted(h, &id).await;
        }

        Ok(all_ok)
    })
}

/// A deleted reading must be gone from the listing of its type
async fn confirm_deleted(h: &mut Harness, id: &str) -> bool {
    let response = h
        .make_request(
            Method::GET,
            "/vitals?reading_type=blood_pressure&limit=100",
            None,
        )
        .await;
    let Some(body) = verify(
        h,
        "GET /api/vitals (after delete)",
        response,
        &[200],
        Shape::All(&["/readings"]),
        "Listing retrieved after delete",
    ) else {
        return false;
    };

    let still_listed = body["readings"].as_array().is_some_and(|readings| {
        readings
            .iter()
            .any(|r| r.get("id").map(id_string).as_deref() == Some(id))
    });

    if still_listed {
        h.failure(format!(
            "DELETE /api/vitals/:id - Reading {} still listed after delete",
            id
        ));
        false
    } else {
        h.success("DELETE /api/vitals/:id - Reading no longer listed");
        true
    }
}

fn vitals_basic(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Vitals Endpoints");
        if !h.require_credential("vitals test") {
            return Ok(false);
        }

        let reading = json!({
            "reading_type": "heart_rate",
            "value": {"value": 72},
            "unit": "bpm",
            "notes": "Resting heart rate"
        });
        let response = h.make_request(Method::POST, "/vitals", Some(&reading)).await;
        let created = verify(
            h,
            "POST /api/vitals",
            response,
            &[200, 201],
            Shape::All(&["/reading"]),
            "Vital reading created successfully",
        )
        .is_some();

        let response = h.make_request(Method::GET, "/vitals", None).await;
        let listed = verify(
            h,
            "GET /api/vitals",
            response,
            &[200],
            Shape::All(&["/readings"]),
            "Vital readings retrieved successfully",
        )
        .is_some();

        Ok(created && listed)
    })
}

fn premium_features(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Premium Features");
        if !h.require_credential("premium features test") {
            return Ok(false);
        }

        let response = h.make_request(Method::GET, "/premium", None).await;
        Ok(verify_reachable(
            h,
            "Premium features",
            response,
            "Endpoint accessible",
        ))
    })
}

fn unauthorized_access(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing Unauthorized Access");

        let endpoints = [
            Protected::get("/auth/profile"),
            Protected::get("/dashboard"),
            Protected::get("/checkins"),
            Protected::get("/medications"),
            Protected::get("/users/family-connections"),
        ];
        Ok(probe_unauthorized(h, "Unauthorized access", &endpoints).await)
    })
}

fn user_logout(h: &mut Harness) -> BoxFuture<'_, Result<bool>> {
    Box::pin(async move {
        h.section("Testing User Logout");
        if !h.require_credential("logout test") {
            return Ok(false);
        }

        let response = h.make_request(Method::POST, "/auth/logout", None).await;
        let body = verify(
            h,
            "User logout",
            response,
            &[200],
            Shape::All(&["/message"]),
            "Success",
        );
        if body.is_none() {
            return Ok(false);
        }

        h.set_credential(None);
        Ok(true)
    })
}
