//! Harness - runs a suite against the API and tallies the outcomes
//!
//! Owns the client (and with it the credential) plus the reporter. Each
//! test case runs behind a barrier: an `Err` or a panic becomes one
//! logged failure and the next case still runs.

use std::any::Any;
use std::ops::{Deref, DerefMut};
use std::panic::AssertUnwindSafe;

use anyhow::Result;
use futures_util::FutureExt;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, ApiResponse};
use crate::config::Config;
use crate::report::{Reporter, Summary, Tally};
use crate::suite::Suite;

/// Test harness state for one run
pub struct Harness {
    client: ApiClient,
    reporter: Reporter,
    /// Id of the user created by registration, if any
    user_id: Option<String>,
}

impl Harness {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
            reporter: Reporter::new(),
            user_id: None,
        })
    }

    pub fn config(&self) -> &Config {
        self.client.config()
    }

    pub fn tally(&self) -> &Tally {
        self.reporter.tally()
    }

    pub fn credential(&self) -> Option<&str> {
        self.client.credential()
    }

    /// Replace the credential, returning the previous one
    pub fn set_credential(&mut self, token: Option<String>) -> Option<String> {
        self.client.set_credential(token)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn set_user_id(&mut self, id: Option<String>) {
        self.user_id = id;
    }

    /// Drop the credential until the returned scope ends
    pub fn anonymous(&mut self) -> CredentialScope<'_> {
        let restore = self.client.set_credential(None);
        CredentialScope {
            harness: self,
            restore,
        }
    }

    /// Issue a request. Transport failures are logged as one failure and
    /// yield `None`.
    pub async fn make_request(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Option<ApiResponse> {
        self.dispatch(method, endpoint, body, None).await
    }

    /// Like `make_request`, with extra headers merged under the credential
    pub async fn make_request_with(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Option<ApiResponse> {
        self.dispatch(method, endpoint, body, Some(headers)).await
    }

    async fn dispatch(
        &mut self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Option<ApiResponse> {
        match self.client.send(method, endpoint, body, headers).await {
            Ok(response) => Some(response),
            Err(e) => {
                self.reporter.failure(e.to_string());
                None
            }
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.reporter.success(message);
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.reporter.failure(message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.reporter.warning(message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.reporter.info(message);
    }

    pub fn section(&self, title: &str) {
        self.reporter.section(title);
    }

    pub fn step(&self, title: &str) {
        self.reporter.step(title);
    }

    /// Warn and return false when no credential is held
    pub fn require_credential(&self, what: &str) -> bool {
        if self.credential().is_some() {
            true
        } else {
            self.warning(format!("Skipping {} - no auth token", what));
            false
        }
    }

    /// Run every case of `suite` in order, then print and return the summary
    pub async fn run(&mut self, suite: &Suite) -> Summary {
        self.reporter.banner(suite.title);
        self.reporter
            .plain(format!("Testing against: {}", self.config().base_url));
        self.reporter
            .plain(format!("API Base: {}", self.config().api_base()));
        info!(suite = suite.name, cases = suite.cases.len(), "starting suite");

        for case in &suite.cases {
            let outcome = AssertUnwindSafe((case.run)(self)).catch_unwind().await;
            match outcome {
                Ok(Ok(passed)) => debug!(case = case.name, passed, "case finished"),
                Ok(Err(e)) => {
                    warn!(case = case.name, error = %e, "case returned an error");
                    self.failure(format!("{} - Exception: {:#}", case.name, e));
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(case = case.name, %message, "case panicked");
                    self.failure(format!("{} - Exception: {}", case.name, message));
                }
            }
        }

        let summary = self.reporter.summary();
        summary.render(suite.summary_title, &suite.verdicts);
        info!(
            suite = suite.name,
            passed = summary.passed,
            failed = summary.failed,
            "suite finished"
        );
        summary
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Credential override that restores the saved token when dropped,
/// including while unwinding
pub struct CredentialScope<'a> {
    harness: &'a mut Harness,
    restore: Option<String>,
}

impl CredentialScope<'_> {
    /// Install `token` instead of the saved credential when the scope ends
    pub fn keep(&mut self, token: String) {
        self.restore = Some(token);
    }
}

impl Deref for CredentialScope<'_> {
    type Target = Harness;

    fn deref(&self) -> &Harness {
        self.harness
    }
}

impl DerefMut for CredentialScope<'_> {
    fn deref_mut(&mut self) -> &mut Harness {
        self.harness
    }
}

impl Drop for CredentialScope<'_> {
    fn drop(&mut self) {
        self.harness.client.set_credential(self.restore.take());
    }
}
