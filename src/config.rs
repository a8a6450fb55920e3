//! Configuration types for cognos-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
///
/// Everything the portal session needs at construction time. The struct
/// deserializes from JSON with every field except the credentials, URL and
/// data source optional. The password is read but never written back out.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Portal user (ex: `APSCN\0401jpenn`). Also decides which "my folders" `~` points to.
    /// A `DOMAIN\` prefix is sent as the domain during NTLM negotiation.
    pub username: String,

    /// Portal password
    #[serde(skip_serializing)]
    pub password: String,

    /// Base URL of the portal (ex: `https://adecognos.arkansas.gov`)
    pub base_url: String,

    /// Data source name passed on the login link (visible in the portal iframe URL)
    pub dsn: String,

    /// CAM namespace passed on the login link (default: "esp")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Retry policy for individual requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Timeout for a single HTTP request (default: 300 seconds)
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub http_timeout: Duration,

    /// Maximum number of requests in flight at once across the whole session (default: 4)
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// How long a request may wait for a free slot (None = wait until one frees up)
    #[serde(default, with = "option_duration_serde")]
    pub admission_timeout: Option<Duration>,

    /// Report polling behaviour
    #[serde(default)]
    pub poll: PollConfig,

    /// Public suffix list (the `public_suffix_list.dat` format) used to reject
    /// cookies scoped to a public suffix. None = no public suffix checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_suffix_list: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("dsn", &self.dsn)
            .field("namespace", &self.namespace)
            .field("retry", &self.retry)
            .field("http_timeout", &self.http_timeout)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("admission_timeout", &self.admission_timeout)
            .field("poll", &self.poll)
            .field("public_suffix_list", &self.public_suffix_list)
            .finish()
    }
}

impl Config {
    /// Create a configuration with default tuning for the given portal and credentials
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
        dsn: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: base_url.into(),
            dsn: dsn.into(),
            namespace: default_namespace(),
            retry: RetryConfig::default(),
            http_timeout: default_http_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
            admission_timeout: None,
            poll: PollConfig::default(),
            public_suffix_list: None,
        }
    }

    /// Check the configuration for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base URL must not be empty", "base_url"));
        }
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::config(
                format!("base URL {} is not a valid URL: {}", self.base_url, e),
                "base_url",
            )
        })?;
        if self.dsn.trim().is_empty() {
            return Err(Error::config("data source name must not be empty", "dsn"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(Error::config(
                "at least one concurrent request must be allowed",
                "max_concurrent_requests",
            ));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed, ready for joining with portal paths
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Delay between report status checks
    pub fn poll_interval(&self) -> Duration {
        self.poll.interval.unwrap_or(self.retry.delay)
    }
}

/// Retry policy for a single portal request
///
/// Attempts are separated by a fixed delay. A request is tried at most
/// `1 + max_retries` times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay between attempts (default: 5 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,

    /// Number of retries after the first attempt (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Stretch each delay by a random 0-100% (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: default_retry_delay(),
            max_retries: default_max_retries(),
            jitter: false,
        }
    }
}

/// Report status polling
///
/// Reports can run for a long time, so polling is unbounded unless a ceiling
/// is configured here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status checks (None = use the retry delay)
    #[serde(default, with = "option_duration_serde")]
    pub interval: Option<Duration>,

    /// Maximum number of status checks for one report run (None = unlimited)
    #[serde(default)]
    pub max_polls: Option<u32>,

    /// Maximum wall-clock time spent polling one report run (None = unlimited)
    #[serde(default, with = "option_duration_serde")]
    pub max_duration: Option<Duration>,
}

fn default_namespace() -> String {
    "esp".to_string()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> u32 {
    3
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
