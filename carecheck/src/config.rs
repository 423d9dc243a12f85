//! Runner configuration
//!
//! Layered with figment: built-in defaults, an optional TOML file, then
//! `CARECHECK_*` environment variables. The binary applies CLI flags last
//! and re-validates.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default server address (the API lives under `DEFAULT_API_PREFIX`)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Default path prefix for every API endpoint
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable prefix (`CARECHECK_BASE_URL`, ...)
pub const ENV_PREFIX: &str = "CARECHECK_";

/// How strictly anonymous requests to protected endpoints are judged
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum UnauthorizedPolicy {
    /// Unreachable endpoints are skipped; at least one must be secured and none open
    #[default]
    Lenient,
    /// Every endpoint must answer 401 or 403
    Strict,
}

/// Depth of the vitals walk in the backend suite
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum VitalsDepth {
    /// Create, list, filter, latest, trends, summary, bulk import, delete
    #[default]
    Comprehensive,
    /// Create one reading and list readings
    Basic,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server address, e.g. `http://localhost:8001`
    pub base_url: String,
    /// Path prefix joined between the base URL and each endpoint
    pub api_prefix: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub unauthorized_policy: UnauthorizedPolicy,
    pub vitals_depth: VitalsDepth,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            unauthorized_policy: UnauthorizedPolicy::default(),
            vitals_depth: VitalsDepth::default(),
        }
    }
}

impl Config {
    /// Configuration pointed at a specific server, everything else default
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Build the provider stack without extracting it
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load and validate configuration from defaults, file and environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }

        let config: Config = Self::figment(file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the base URL and timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL with the API prefix, e.g. `http://localhost:8001/api`
    pub fn api_base(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/')
        )
    }

    /// Full URL for an endpoint; a missing leading slash is inserted
    pub fn api_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.api_base(), endpoint)
        } else {
            format!("{}/{}", self.api_base(), endpoint)
        }
    }
}
