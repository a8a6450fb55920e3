//! Common test utilities for cognos-dl integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use cognos_dl::{CognosClient, Config};
use std::time::Duration;
use wiremock::MockServer;

/// Configuration pointed at a mock portal, with short delays
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::new("user", "pass", base_url, "testdsn");
    config.retry.delay = Duration::from_millis(20);
    config.retry.max_retries = 2;
    config.poll.interval = Some(Duration::from_millis(10));
    config.http_timeout = Duration::from_secs(10);
    config
}

/// Client for a mock portal with the default test configuration
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> CognosClient {
    CognosClient::new(test_config(&server.uri())).expect("test config is valid")
}

/// `Authorization` header value for user/pass
#[allow(dead_code)]
pub const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz";
