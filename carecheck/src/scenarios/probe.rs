//! Unauthorized-access probe
//!
//! Hits protected endpoints without a credential and judges the answers
//! under the configured `UnauthorizedPolicy`. The credential is dropped
//! through a scope, so it is back in place however the probe ends.

use reqwest::Method;
use serde_json::Value;

use crate::config::UnauthorizedPolicy;
use crate::harness::Harness;

/// A protected endpoint and the body to send with it
#[derive(Debug, Clone)]
pub struct Protected {
    pub method: Method,
    pub path: &'static str,
    pub body: Option<Value>,
}

impl Protected {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            body: None,
        }
    }

    pub fn post(path: &'static str, body: Value) -> Self {
        Self {
            method: Method::POST,
            path,
            body: Some(body),
        }
    }
}

/// Per-endpoint results of one probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeTally {
    /// Answered 401 or 403
    pub secured: usize,
    /// Answered anything else
    pub open: usize,
    /// No response at all
    pub unreachable: usize,
}

/// How a probe ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    Secured,
    /// Some endpoints secured, some issues found (lenient only)
    Partial,
    /// Nothing could be tested (lenient only)
    Untested,
    Insecure,
}

impl ProbeTally {
    pub fn total(&self) -> usize {
        self.secured + self.open + self.unreachable
    }

    pub fn verdict(&self, policy: UnauthorizedPolicy) -> ProbeVerdict {
        match policy {
            UnauthorizedPolicy::Lenient => {
                if self.secured > 0 && self.open == 0 {
                    ProbeVerdict::Secured
                } else if self.secured > 0 {
                    ProbeVerdict::Partial
                } else if self.open == 0 {
                    ProbeVerdict::Untested
                } else {
                    ProbeVerdict::Insecure
                }
            }
            UnauthorizedPolicy::Strict => {
                if self.total() > 0 && self.secured == self.total() {
                    ProbeVerdict::Secured
                } else {
                    ProbeVerdict::Insecure
                }
            }
        }
    }
}

/// Probe `endpoints` anonymously and log the verdict under `label`
pub async fn probe_unauthorized(h: &mut Harness, label: &str, endpoints: &[Protected]) -> bool {
    let policy = h.config().unauthorized_policy;
    let mut tally = ProbeTally::default();

    {
        let mut scope = h.anonymous();
        for endpoint in endpoints {
            let response = scope
                .make_request(endpoint.method.clone(), endpoint.path, endpoint.body.as_ref())
                .await;

            match response {
                None => {
                    tally.unreachable += 1;
                    if policy == UnauthorizedPolicy::Lenient {
                        scope.warning(format!(
                            "{} - {} {} connection failed, skipping",
                            label, endpoint.method, endpoint.path
                        ));
                    }
                }
                Some(r) if r.is(&[401, 403]) => tally.secured += 1,
                Some(r) => {
                    tally.open += 1;
                    scope.failure(format!(
                        "{} - {} {} should require auth but returned {}",
                        label,
                        endpoint.method,
                        endpoint.path,
                        r.code()
                    ));
                }
            }
        }
    }

    match tally.verdict(policy) {
        ProbeVerdict::Secured => {
            h.success(format!("{} - Protected endpoints properly secured", label));
            true
        }
        ProbeVerdict::Partial => {
            h.warning(format!(
                "{} - Some endpoints properly secured, some issues found",
                label
            ));
            false
        }
        ProbeVerdict::Untested => {
            h.failure(format!("{} - Could not test due to connection issues", label));
            false
        }
        ProbeVerdict::Insecure => {
            h.failure(format!(
                "{} - Only {}/{} endpoints properly secured",
                label,
                tally.secured,
                tally.total()
            ));
            false
        }
    }
}
