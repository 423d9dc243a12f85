//! API client - bearer-authenticated JSON requests over reqwest
//!
//! The client owns the credential so it is attached to every request
//! while held. Transport failures are classified, never retried.

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Transport-level failures (no HTTP status was obtained)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed to {url}")]
    Connect { url: String },

    #[error("Request timeout to {url}")]
    Timeout { url: String },

    #[error("Request error to {url}: invalid credential header")]
    InvalidCredential { url: String },

    #[error("Request error to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    fn classify(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout { url }
        } else if err.is_connect() {
            TransportError::Connect { url }
        } else {
            TransportError::Request { url, source: err }
        }
    }
}

/// A completed HTTP exchange: status plus the raw body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Numeric status code
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Whether the status is one of `codes`
    pub fn is(&self, codes: &[u16]) -> bool {
        codes.contains(&self.code())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// `Status <code>: <payload>` for failure messages; JSON bodies are
    /// re-serialized compactly, anything else is shown as text
    pub fn describe(&self) -> String {
        match self.json() {
            Ok(value) => format!("Status {}: {}", self.code(), value),
            Err(_) => format!("Status {}: {}", self.code(), self.body),
        }
    }
}

/// HTTP client for the SeniorCare API
pub struct ApiClient {
    http: Client,
    config: Config,
    credential: Option<String>,
}

impl ApiClient {
    /// Create a client with the configured timeout and no credential
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            config,
            credential: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The bearer token currently attached to requests
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Replace the credential, returning the previous one
    pub fn set_credential(&mut self, token: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.credential, token)
    }

    /// Dispatch one request. A body is only sent for POST and PUT.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.config.api_url(endpoint);

        let mut headers = extra_headers.cloned().unwrap_or_default();
        if let Some(token) = &self.credential {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| TransportError::InvalidCredential { url: url.clone() })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            if method == Method::POST || method == Method::PUT {
                request = request.json(body);
            }
        }

        let started = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        }
        .await;

        match result {
            Ok((status, text)) => {
                debug!(
                    %method,
                    %url,
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "request completed"
                );
                Ok(ApiResponse::new(status, text))
            }
            Err(e) => {
                let err = TransportError::classify(&url, e);
                warn!(%method, %url, error = %err, "request failed");
                Err(err)
            }
        }
    }
}
