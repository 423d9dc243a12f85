//! carecheck - SeniorCare Hub API test runner

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use carecheck::{run_suites, Config, SuiteKind, UnauthorizedPolicy, VitalsDepth};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run the SeniorCare Hub API test suites against a live server
#[derive(Parser, Debug)]
#[command(name = "carecheck", version, about)]
struct Args {
    /// Suite to run
    #[arg(value_enum, default_value_t = SuiteKind::Backend)]
    suite: SuiteKind,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server base URL (the API prefix is appended)
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// How strictly unauthorized access probes are judged
    #[arg(long, value_enum)]
    policy: Option<UnauthorizedPolicy>,

    /// Depth of the vitals walk in the backend suite
    #[arg(long, value_enum)]
    vitals: Option<VitalsDepth>,

    /// Debug-level tracing on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if let Some(policy) = self.policy {
            config.unauthorized_policy = policy;
        }
        if let Some(depth) = self.vitals {
            config.vitals_depth = depth;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Tracing goes to stderr so the report on stdout stays readable
    let default_filter = if args.verbose {
        "carecheck=debug"
    } else {
        "carecheck=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    match run_suites(&config, args.suite).await {
        Ok(summaries) if summaries.iter().all(|s| s.is_clean()) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
