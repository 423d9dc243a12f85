//! Suites - ordered lists of named test cases
//!
//! A suite is plain data; the harness walks it front to back.

use anyhow::Result;
use futures_util::future::BoxFuture;

use crate::config::Config;
use crate::harness::Harness;
use crate::report::Verdicts;
use crate::scenarios;

/// A test case operation. The returned flag is informational; outcomes
/// are recorded through the harness logging calls.
pub type CaseFn = for<'a> fn(&'a mut Harness) -> BoxFuture<'a, Result<bool>>;

/// One named scenario
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub run: CaseFn,
}

impl TestCase {
    pub const fn new(name: &'static str, run: CaseFn) -> Self {
        Self { name, run }
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase").field("name", &self.name).finish()
    }
}

/// An ordered scenario list with its report wording
#[derive(Debug, Clone)]
pub struct Suite {
    /// Short identifier used in logs
    pub name: &'static str,
    /// Banner printed before the first case
    pub title: &'static str,
    /// Heading of the closing summary
    pub summary_title: &'static str,
    pub verdicts: Verdicts,
    pub cases: Vec<TestCase>,
}

impl Suite {
    pub fn case_names(&self) -> Vec<&'static str> {
        self.cases.iter().map(|c| c.name).collect()
    }
}

/// Which suites to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SuiteKind {
    /// Full product walk: auth, check-ins, medications, vitals, ...
    #[default]
    Backend,
    /// Vitals validation and edge cases
    VitalsEdge,
    /// Backend followed by vitals-edge
    All,
}

impl SuiteKind {
    /// Build the suites for this selection, in run order
    pub fn suites(&self, config: &Config) -> Vec<Suite> {
        match self {
            SuiteKind::Backend => vec![scenarios::backend::suite(config)],
            SuiteKind::VitalsEdge => vec![scenarios::vitals_edge::suite()],
            SuiteKind::All => vec![
                scenarios::backend::suite(config),
                scenarios::vitals_edge::suite(),
            ],
        }
    }
}
