//! Scenario suites for the SeniorCare Hub API
//!
//! - `backend`: the full product walk, registration through logout
//! - `vitals_edge`: vitals validation, limits and edge cases

pub mod backend;
pub mod checks;
pub mod probe;
pub mod vitals_edge;

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use crate::harness::Harness;

static EMAIL_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Timestamp-derived address that does not repeat across or within runs
pub fn unique_email(prefix: &str) -> String {
    let n = EMAIL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}.{}.{}@example.com",
        prefix,
        Utc::now().timestamp_millis(),
        n
    )
}

/// Take the token and user id out of a register/login payload and make
/// them the harness credential
pub(crate) fn adopt_session(h: &mut Harness, body: &Value) -> Result<()> {
    let token = body["token"]
        .as_str()
        .context("token is not a string")?
        .to_string();
    h.set_credential(Some(token));
    h.set_user_id(body.pointer("/user/id").map(id_string));
    Ok(())
}

/// Ids may come back as numbers or strings
pub(crate) fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
