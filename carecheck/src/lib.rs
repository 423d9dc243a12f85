//! carecheck - black-box API test runner for the SeniorCare Hub backend
//!
//! Runs ordered scenario suites against a live server, tallies every
//! logged outcome and prints a colored report with a verdict banner.

pub mod client;
pub mod config;
pub mod harness;
pub mod report;
pub mod scenarios;
pub mod suite;

pub use client::{ApiClient, ApiResponse, TransportError};
pub use config::{Config, ConfigError, UnauthorizedPolicy, VitalsDepth};
pub use harness::{CredentialScope, Harness};
pub use report::{Reporter, Summary, Tally, Tier, Verdicts};
pub use suite::{CaseFn, Suite, SuiteKind, TestCase};

use anyhow::Result;
use tracing::info;

/// Run the selected suites one after another, each with a fresh harness
pub async fn run_suites(config: &Config, kind: SuiteKind) -> Result<Vec<Summary>> {
    let mut summaries = Vec::new();
    for suite in kind.suites(config) {
        let mut harness = Harness::new(config.clone())?;
        summaries.push(harness.run(&suite).await);
    }

    let failed: usize = summaries.iter().map(|s| s.failed).sum();
    info!(suites = summaries.len(), failed, "run complete");
    Ok(summaries)
}
