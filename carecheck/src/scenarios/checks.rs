//! Response checks shared by the scenario bodies
//!
//! Each check logs exactly one outcome for a response it received. An
//! absent response was already logged by the request wrapper, so the
//! checks stay silent on `None`.

use serde_json::Value;

use crate::client::ApiResponse;
use crate::harness::Harness;

/// Expected payload shape, keys given as JSON pointers (`/user/id`)
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Any JSON body
    Json,
    /// Every pointer must resolve
    All(&'static [&'static str]),
    /// At least one pointer must resolve
    Any(&'static [&'static str]),
    /// The pointer must resolve to this string
    Field(&'static str, &'static str),
}

impl Shape {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Shape::Json => true,
            Shape::All(keys) => keys.iter().all(|k| value.pointer(k).is_some()),
            Shape::Any(keys) => keys.iter().any(|k| value.pointer(k).is_some()),
            Shape::Field(key, expected) => {
                value.pointer(key).and_then(Value::as_str) == Some(*expected)
            }
        }
    }

    /// What was missing, for failure messages
    fn describe_miss(&self) -> String {
        match self {
            Shape::Json => "Unexpected response".to_string(),
            Shape::All(keys) => format!("Missing {}", key_list(keys, " and ")),
            Shape::Any(keys) => format!("Missing {}", key_list(keys, " or ")),
            Shape::Field(key, expected) => {
                format!("Expected {} = {:?}", key.trim_start_matches('/'), expected)
            }
        }
    }
}

fn key_list(keys: &[&str], sep: &str) -> String {
    keys.iter()
        .map(|k| k.trim_start_matches('/').replace('/', "."))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Check status and payload shape. Logs one success or failure and
/// returns the parsed body on success.
pub fn verify(
    h: &mut Harness,
    label: &str,
    response: Option<ApiResponse>,
    accepted: &[u16],
    shape: Shape,
    on_success: &str,
) -> Option<Value> {
    let response = response?;

    if !response.is(accepted) {
        h.failure(format!("{} - {}", label, response.describe()));
        return None;
    }

    let body = match response.json() {
        Ok(body) => body,
        Err(_) => {
            h.failure(format!("{} - Invalid JSON response", label));
            return None;
        }
    };

    if !shape.matches(&body) {
        h.failure(format!("{} - {} in response: {}", label, shape.describe_miss(), body));
        return None;
    }

    h.success(format!("{} - {}", label, on_success));
    Some(body)
}

/// Pass on any status below 500
pub fn verify_reachable(
    h: &mut Harness,
    label: &str,
    response: Option<ApiResponse>,
    on_success: &str,
) -> bool {
    let Some(response) = response else {
        return false;
    };

    if response.status().is_server_error() {
        h.failure(format!("{} - {}", label, response.describe()));
        false
    } else {
        h.success(format!("{} - {}", label, on_success));
        true
    }
}

/// Pass when the status is one of `accepted`
pub fn expect_status(
    h: &mut Harness,
    label: &str,
    response: Option<&ApiResponse>,
    accepted: &[u16],
    on_success: &str,
) -> bool {
    let Some(response) = response else {
        return false;
    };

    if response.is(accepted) {
        h.success(format!("{} - {}", label, on_success));
        true
    } else {
        h.failure(format!(
            "{} - Expected {}, got {}",
            label,
            status_list(accepted),
            response.code()
        ));
        false
    }
}

/// `400` or `200/201`
pub fn status_list(codes: &[u16]) -> String {
    codes
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
