//! Result reporting
//!
//! Every logged outcome prints one colored, emoji-prefixed console line.
//! Only successes and failures reach the tally; warnings and info lines
//! are informational.

use colored::{Color, Colorize};

/// Pass/fail accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    passed: usize,
    failed: usize,
    /// Failure messages in the order they were logged
    failures: Vec<String>,
}

impl Tally {
    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Number of logged outcomes
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    fn record_success(&mut self) {
        self.passed += 1;
    }

    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.failures.push(message);
    }
}

/// Console reporter owning the tally
#[derive(Debug, Default)]
pub struct Reporter {
    tally: Tally,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Log a passed outcome
    pub fn success(&mut self, message: impl Into<String>) {
        let message = message.into();
        emit(format!("✅ {}", message), Color::Green);
        self.tally.record_success();
    }

    /// Log a failed outcome
    pub fn failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        emit(format!("❌ {}", message), Color::Red);
        self.tally.record_failure(message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        emit(format!("⚠️  {}", message.as_ref()), Color::Yellow);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        emit(format!("ℹ️  {}", message.as_ref()), Color::Blue);
    }

    /// Uncolored line
    pub fn plain(&self, message: impl AsRef<str>) {
        println!("{}", message.as_ref());
    }

    /// `=== title ===` header opening a test case
    pub fn section(&self, title: &str) {
        println!("\n{}", format!("=== {} ===", title).bold());
    }

    /// Sub-step inside a test case
    pub fn step(&self, title: &str) {
        println!("\n{}", title.blue());
    }

    /// Suite banner
    pub fn banner(&self, title: &str) {
        println!("\n{}", title.cyan().bold());
    }

    /// Snapshot of the current tally
    pub fn summary(&self) -> Summary {
        Summary::from_tally(&self.tally)
    }
}

fn emit(line: String, color: Color) {
    println!("{}", line.color(color));
}

/// Qualitative verdict derived from the success rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// 80% and above
    WorkingWell,
    /// 60% up to 80%
    SomeIssues,
    /// Below 60%
    MajorIssues,
}

impl Tier {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            Tier::WorkingWell
        } else if rate >= 60.0 {
            Tier::SomeIssues
        } else {
            Tier::MajorIssues
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            Tier::WorkingWell => "🎉",
            Tier::SomeIssues => "⚠️ ",
            Tier::MajorIssues => "🚨",
        }
    }

    fn color(&self) -> Color {
        match self {
            Tier::WorkingWell => Color::Green,
            Tier::SomeIssues => Color::Yellow,
            Tier::MajorIssues => Color::Red,
        }
    }
}

/// Per-suite wording for each tier
#[derive(Debug, Clone, Copy)]
pub struct Verdicts {
    pub working_well: &'static str,
    pub some_issues: &'static str,
    pub major_issues: &'static str,
}

impl Verdicts {
    pub fn phrase(&self, tier: Tier) -> &'static str {
        match tier {
            Tier::WorkingWell => self.working_well,
            Tier::SomeIssues => self.some_issues,
            Tier::MajorIssues => self.major_issues,
        }
    }
}

/// Final state of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

impl Summary {
    pub fn from_tally(tally: &Tally) -> Self {
        Self {
            passed: tally.passed,
            failed: tally.failed,
            failures: tally.failures.clone(),
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Percentage of passed outcomes; 0 when nothing was logged
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.passed as f64 / total as f64 * 100.0
        }
    }

    pub fn tier(&self) -> Tier {
        Tier::from_rate(self.success_rate())
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// The closing verdict line, e.g. `🎉 Success Rate: 92.3% - Backend is working well!`
    pub fn verdict_line(&self, verdicts: &Verdicts) -> String {
        let tier = self.tier();
        format!(
            "{} Success Rate: {:.1}% - {}",
            tier.emoji(),
            self.success_rate(),
            verdicts.phrase(tier)
        )
    }

    /// Print totals, failures and the verdict banner
    pub fn render(&self, title: &str, verdicts: &Verdicts) {
        println!("\n{}", format!("📊 {}", title).cyan().bold());
        println!("Total Tests: {}", self.total());
        println!("{}", format!("✅ Passed: {}", self.passed).green());
        println!("{}", format!("❌ Failed: {}", self.failed).red());

        if !self.failures.is_empty() {
            println!("\n{}", "❌ Failed Tests:".bold());
            for failure in &self.failures {
                println!("{}", format!("  • {}", failure).red());
            }
        }

        println!("\n{}", self.verdict_line(verdicts).color(self.tier().color()));
    }
}
