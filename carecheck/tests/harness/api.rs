//! StubApi - in-memory stand-in for the SeniorCare Hub REST API
//!
//! Implements just enough of the real routes for the suites to exercise:
//! bearer-token auth, check-ins, medications, family connections and the
//! full vitals surface including bulk-import validation.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Reading types the API accepts
pub const READING_TYPES: &[&str] = &[
    "blood_pressure",
    "heart_rate",
    "temperature",
    "weight",
    "blood_sugar",
    "oxygen_saturation",
];

/// Behaviour switches for negative tests
#[derive(Debug, Clone, Copy)]
pub struct StubOptions {
    /// Reject anonymous requests to protected routes with 401
    pub enforce_auth: bool,
    /// Answer `GET /premium` with a 500
    pub broken_premium: bool,
    /// Acknowledge `DELETE /vitals/{id}` without removing the reading
    pub ignore_deletes: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            enforce_auth: true,
            broken_premium: false,
            ignore_deletes: false,
        }
    }
}

#[derive(Debug, Clone)]
struct User {
    id: u64,
    email: String,
    password: String,
    first_name: String,
    role: String,
}

impl User {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "firstName": self.first_name,
            "role": self.role,
        })
    }
}

#[derive(Debug, Clone)]
struct Reading {
    id: u64,
    owner: u64,
    body: Value,
}

impl Reading {
    fn to_json(&self) -> Value {
        let mut value = self.body.clone();
        value["id"] = json!(self.id);
        value["user_id"] = json!(self.owner);
        value
    }

    fn reading_type(&self) -> &str {
        self.body["reading_type"].as_str().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    users: HashMap<String, User>,
    /// token -> user id
    tokens: HashMap<String, u64>,
    readings: Vec<Reading>,
    checkins: Vec<Value>,
    medications: Vec<Value>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_by_id(&self, id: u64) -> Option<&User> {
        self.users.values().find(|u| u.id == id)
    }

    fn issue_token(&mut self, user_id: u64) -> String {
        let token = format!("tok-{}-{}", user_id, self.next_id());
        self.tokens.insert(token.clone(), user_id);
        token
    }
}

/// Shared stub state
pub struct StubState {
    options: StubOptions,
    store: Mutex<Store>,
}

impl StubState {
    pub fn new(options: StubOptions) -> Self {
        Self {
            options,
            store: Mutex::new(Store::default()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().users.len()
    }

    pub fn reading_count(&self) -> usize {
        self.store.lock().readings.len()
    }

    pub fn active_tokens(&self) -> usize {
        self.store.lock().tokens.len()
    }
}

type Shared = Arc<StubState>;
type Reply = Result<Response, Response>;

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn ok(status: StatusCode, body: Value) -> Reply {
    Ok((status, Json(body)).into_response())
}

/// Resolve the bearer token to a user id; 0 stands for an anonymous
/// caller when auth is not enforced
fn authorize(state: &StubState, headers: &HeaderMap) -> Result<u64, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let store = state.store.lock();
    match token.and_then(|t| store.tokens.get(t)) {
        Some(id) => Ok(*id),
        None if !state.options.enforce_auth => Ok(0),
        None => Err(error(StatusCode::UNAUTHORIZED, "Access token required")),
    }
}

/// Build the router, mounted under `/api`
pub fn router(state: Shared) -> Router {
    let mut api = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
        .route("/auth/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/checkins", get(list_checkins).post(create_checkin))
        .route("/medications", get(list_medications).post(create_medication))
        .route("/users/family-connections", get(family_connections))
        .route("/vitals", get(list_vitals).post(create_vital))
        .route("/vitals/latest", get(latest_vitals))
        .route("/vitals/trends/{reading_type}", get(vital_trends))
        .route("/vitals/summary", get(vital_summary))
        .route("/vitals/bulk-import", post(bulk_import))
        .route("/vitals/{id}", delete(delete_vital));

    if state.options.broken_premium {
        api = api.route("/premium", get(broken));
    }

    Router::new().nest("/api", api.with_state(state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn broken() -> Response {
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let (Some(email), Some(password)) = (body["email"].as_str(), body["password"].as_str()) else {
        return Err(error(StatusCode::BAD_REQUEST, "Email and password are required"));
    };

    let mut store = state.store.lock();
    if store.users.contains_key(email) {
        return Err(error(StatusCode::BAD_REQUEST, "User already exists"));
    }

    let user = User {
        id: store.next_id(),
        email: email.to_string(),
        password: password.to_string(),
        first_name: body["firstName"].as_str().unwrap_or_default().to_string(),
        role: body["role"].as_str().unwrap_or("senior").to_string(),
    };
    let token = store.issue_token(user.id);
    let user_json = user.to_json();
    store.users.insert(user.email.clone(), user);

    ok(
        StatusCode::CREATED,
        json!({ "message": "User registered successfully", "token": token, "user": user_json }),
    )
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut store = state.store.lock();
    let user = match store.users.get(email) {
        Some(user) if user.password == password => user.clone(),
        _ => return Err(error(StatusCode::UNAUTHORIZED, "Invalid credentials")),
    };
    let token = store.issue_token(user.id);

    ok(
        StatusCode::OK,
        json!({ "message": "Login successful", "token": token, "user": user.to_json() }),
    )
}

fn user_json(state: &StubState, id: u64) -> Value {
    state
        .store
        .lock()
        .user_by_id(id)
        .map(User::to_json)
        .unwrap_or_else(|| json!({ "id": id, "email": "anonymous@example.com" }))
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let id = authorize(&state, &headers)?;
    ok(StatusCode::OK, json!({ "user": user_json(&state, id) }))
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;

    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.store.lock().tokens.remove(token);
    }
    ok(StatusCode::OK, json!({ "message": "Logged out successfully" }))
}

async fn dashboard(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let id = authorize(&state, &headers)?;
    ok(
        StatusCode::OK,
        json!({ "user": user_json(&state, id), "todayCheckIn": null, "medications": [] }),
    )
}

async fn create_checkin(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&state, &headers)?;
    state.store.lock().checkins.push(body.clone());
    ok(
        StatusCode::CREATED,
        json!({ "message": "Check-in saved", "checkIn": body }),
    )
}

async fn list_checkins(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    let checkins = state.store.lock().checkins.clone();
    ok(StatusCode::OK, json!({ "checkIns": checkins }))
}

async fn create_medication(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    authorize(&state, &headers)?;
    if body["name"].as_str().is_none() {
        return Err(error(StatusCode::BAD_REQUEST, "Medication name is required"));
    }
    state.store.lock().medications.push(body.clone());
    ok(StatusCode::CREATED, json!({ "medication": body }))
}

async fn list_medications(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    let medications = state.store.lock().medications.clone();
    ok(StatusCode::OK, json!({ "medications": medications }))
}

async fn family_connections(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    ok(StatusCode::OK, json!({ "connections": [] }))
}

fn validate_reading(reading: &Value) -> Result<(), String> {
    let reading_type = reading["reading_type"]
        .as_str()
        .ok_or("reading_type is required")?;
    if !READING_TYPES.contains(&reading_type) {
        return Err(format!("invalid reading_type '{}'", reading_type));
    }
    if !reading["value"].is_object() {
        return Err("value must be an object".to_string());
    }
    if reading["unit"].as_str().is_none() {
        return Err("unit is required".to_string());
    }
    if reading["notes"].as_str().is_some_and(|n| n.chars().count() > 500) {
        return Err("notes must be at most 500 characters".to_string());
    }
    Ok(())
}

fn is_abnormal(reading: &Value) -> bool {
    match reading["reading_type"].as_str() {
        Some("heart_rate") => reading["value"]["value"]
            .as_f64()
            .is_some_and(|bpm| !(50.0..=100.0).contains(&bpm)),
        Some("blood_pressure") => reading["value"]["systolic"]
            .as_f64()
            .is_some_and(|s| s > 140.0),
        _ => false,
    }
}

async fn create_vital(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let owner = authorize(&state, &headers)?;
    validate_reading(&body).map_err(|e| error(StatusCode::BAD_REQUEST, &e))?;

    let mut store = state.store.lock();
    let reading = Reading {
        id: store.next_id(),
        owner,
        body: body.clone(),
    };
    let reading_json = reading.to_json();
    store.readings.push(reading);

    ok(
        StatusCode::CREATED,
        json!({
            "message": "Vital reading recorded",
            "reading": reading_json,
            "alertCreated": is_abnormal(&body),
        }),
    )
}

async fn list_vitals(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let owner = authorize(&state, &headers)?;

    if let Some(start) = params.get("start_date") {
        if chrono::NaiveDate::parse_from_str(start, "%Y-%m-%d").is_err() {
            return Err(error(StatusCode::BAD_REQUEST, "Invalid start_date"));
        }
    }

    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(50)
        .min(100);
    let filter = params.get("reading_type");

    let store = state.store.lock();
    let matching: Vec<Value> = store
        .readings
        .iter()
        .filter(|r| r.owner == owner)
        .filter(|r| filter.is_none_or(|t| r.reading_type() == t.as_str()))
        .map(Reading::to_json)
        .collect();
    let total = matching.len();
    let readings: Vec<Value> = matching.into_iter().take(limit).collect();

    ok(
        StatusCode::OK,
        json!({
            "readings": readings,
            "pagination": { "page": 1, "limit": limit, "total": total }
        }),
    )
}

async fn latest_vitals(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let owner = authorize(&state, &headers)?;

    let store = state.store.lock();
    let mut latest = serde_json::Map::new();
    for reading in store.readings.iter().filter(|r| r.owner == owner) {
        latest.insert(reading.reading_type().to_string(), reading.to_json());
    }
    ok(StatusCode::OK, json!({ "latestReadings": latest }))
}

async fn vital_trends(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(reading_type): Path<String>,
) -> Reply {
    let owner = authorize(&state, &headers)?;
    if !READING_TYPES.contains(&reading_type.as_str()) {
        return Err(error(StatusCode::NOT_FOUND, "Unknown reading type"));
    }

    let store = state.store.lock();
    let points: Vec<Value> = store
        .readings
        .iter()
        .filter(|r| r.owner == owner && r.reading_type() == reading_type)
        .map(Reading::to_json)
        .collect();
    let count = points.len();
    ok(
        StatusCode::OK,
        json!({ "trendData": points, "statistics": { "count": count } }),
    )
}

async fn vital_summary(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let owner = authorize(&state, &headers)?;
    let days = params
        .get("days")
        .and_then(|d| d.parse::<u32>().ok())
        .unwrap_or(30);

    let store = state.store.lock();
    let mut counts = serde_json::Map::new();
    for reading in store.readings.iter().filter(|r| r.owner == owner) {
        let entry = counts
            .entry(reading.reading_type().to_string())
            .or_insert(json!(0));
        *entry = json!(entry.as_u64().unwrap_or(0) + 1);
    }
    ok(
        StatusCode::OK,
        json!({ "summary": counts, "timeRange": { "days": days } }),
    )
}

async fn bulk_import(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let owner = authorize(&state, &headers)?;

    let Some(readings) = body["readings"].as_array() else {
        return Err(error(StatusCode::BAD_REQUEST, "readings must be an array"));
    };
    if readings.is_empty() || readings.len() > 100 {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "readings must contain between 1 and 100 entries",
        ));
    }
    // All or nothing
    for (i, reading) in readings.iter().enumerate() {
        validate_reading(reading)
            .map_err(|e| error(StatusCode::BAD_REQUEST, &format!("reading {}: {}", i, e)))?;
    }

    let mut store = state.store.lock();
    for reading in readings {
        let id = store.next_id();
        store.readings.push(Reading {
            id,
            owner,
            body: reading.clone(),
        });
    }

    ok(
        StatusCode::CREATED,
        json!({
            "message": "Readings imported",
            "imported": readings.len(),
            "deviceId": body["device_id"].clone(),
        }),
    )
}

async fn delete_vital(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Reply {
    let owner = authorize(&state, &headers)?;

    let mut store = state.store.lock();
    if !store.readings.iter().any(|r| r.id == id && r.owner == owner) {
        return Err(error(StatusCode::NOT_FOUND, "Vital reading not found"));
    }
    if !state.options.ignore_deletes {
        store.readings.retain(|r| !(r.id == id && r.owner == owner));
    }
    ok(StatusCode::OK, json!({ "message": "Vital reading deleted successfully" }))
}
