//! Portal session split into focused submodules.
//!
//! The `CognosClient` struct and its methods are organized by domain:
//! - [`transport`] - Bounded, retrying HTTP requests with session cookies
//! - [`cookies`] - The session cookie jar
//! - [`folders`] - Root discovery, folder listing and path resolution
//! - [`report`] - Report submission, status polling and CSV download

mod cookies;
mod folders;
mod report;
mod transport;

use crate::admission::AdmissionGate;
use crate::config::Config;
use crate::error::{Error, Result};
use cookies::SessionCookies;
use std::sync::Arc;

/// User agent sent with every portal request
const CLIENT_USER_AGENT: &str = concat!("cognos-dl/", env!("CARGO_PKG_VERSION"));

/// An authenticated session with one portal
///
/// Cloning is cheap and every clone shares the same cookie jar and the same
/// pool of request slots, so the concurrency limit holds across all of them.
#[derive(Clone)]
pub struct CognosClient {
    /// Validated configuration
    config: Arc<Config>,
    /// HTTP client; owns the session cookie store
    http: reqwest::Client,
    /// Bounds the number of requests in flight
    gate: AdmissionGate,
}

impl std::fmt::Debug for CognosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognosClient")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl CognosClient {
    /// Create a session from a configuration
    ///
    /// No request is made here. The first request (normally
    /// [`folder_roots`](Self::folder_roots)) establishes the session cookies.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let cookies = SessionCookies::load(config.public_suffix_list.as_deref())?;
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(cookies))
            .timeout(config.http_timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: None,
            })?;

        let gate = AdmissionGate::new(config.max_concurrent_requests, config.admission_timeout);

        tracing::debug!(
            base_url = %config.base_url,
            max_concurrent_requests = config.max_concurrent_requests,
            max_retries = config.retry.max_retries,
            "Created portal session"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            gate,
        })
    }

    /// The session's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session's request slot pool
    pub fn admission_gate(&self) -> &AdmissionGate {
        &self.gate
    }
}
