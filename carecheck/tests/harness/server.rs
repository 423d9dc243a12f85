//! StubServer - in-process SeniorCare Hub API on a random port
//!
//! The listener is bound before the router is spawned, so the server
//! accepts connections as soon as `start` returns.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use carecheck::{Config, Harness, UnauthorizedPolicy};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::api::{self, StubOptions, StubState};

/// Stub API server, shut down when dropped
pub struct StubServer {
    pub addr: SocketAddr,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Start a conforming server
    pub async fn start() -> Result<Self> {
        Self::start_with(StubOptions::default()).await
    }

    /// Start a server with behaviour switches
    pub async fn start_with(options: StubOptions) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(StubState::new(options));
        let router = api::router(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                eprintln!("Stub server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Default runner configuration pointing at this server
    pub fn config(&self) -> Config {
        Config::for_base_url(self.base_url())
    }

    /// Configuration with a specific unauthorized-access policy
    pub fn config_with_policy(&self, policy: UnauthorizedPolicy) -> Config {
        let mut config = self.config();
        config.unauthorized_policy = policy;
        config
    }

    /// Fresh harness against this server
    pub fn harness(&self) -> Harness {
        Harness::new(self.config()).expect("Failed to build harness")
    }

    pub fn state(&self) -> &StubState {
        &self.state
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
