//! Error types for cognos-dl
//!
//! Every operation in the crate returns [`Result`]. The variants fall into four
//! families:
//! - transport failures ([`Error::Network`], [`Error::HttpStatus`], [`Error::RetriesExhausted`])
//! - the portal's spurious 401s ([`Error::Unauthorized`]), retried by the transport
//! - page-format deviations ([`Error::Protocol`]), never retried
//! - unsupported reports ([`Error::UnsupportedReport`])

use std::time::Duration;
use thiserror::Error;

/// Result type alias for cognos-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cognos-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Network or I/O failure while talking to the portal
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The portal answered 401. It does this at random during normal operation,
    /// so the transport retries it like a network hiccup.
    #[error("portal returned 401 Unauthorized for {path}")]
    Unauthorized {
        /// Path or URL that was requested
        path: String,
    },

    /// Any non-200 status other than 401
    #[error("portal returned HTTP {status} for {path}")]
    HttpStatus {
        /// The status code returned by the portal
        status: u16,
        /// Path or URL that was requested
        path: String,
    },

    /// Every attempt allowed by the retry policy failed
    #[error("request to {path} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Path or URL that was requested
        path: String,
        /// Number of attempts made (first attempt plus retries)
        attempts: u32,
        /// The error from the final attempt
        last_error: Box<Error>,
    },

    /// A marker or field the client relies on was missing from a portal page
    #[error("unrecognized portal response: {0}")]
    Protocol(#[from] ProtocolError),

    /// The report asked for prompt values; only reports with saved defaults are supported
    #[error("report {id} prompted for additional information")]
    UnsupportedReport {
        /// The report's object id
        id: String,
    },

    /// A folder path could not be resolved
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The configured polling ceiling was reached before the report finished
    #[error("report {id} still running after {polls} status checks")]
    PollLimitExceeded {
        /// The report's object id
        id: String,
        /// Number of status checks made
        polls: u32,
    },

    /// The caller's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// No request slot became available within the admission timeout
    #[error("no request slot available after {waited:?}")]
    AdmissionTimeout {
        /// How long the caller waited for a slot
        waited: Duration,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A portal page did not match the format this client understands
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The login page lacked a root folder assignment
    #[error("cannot find {root} root folder id in login page")]
    MissingRootId {
        /// Which root was missing ("public" or "my folders")
        root: &'static str,
    },

    /// A value needed to build the next status check was missing
    #[error("could not find value {key} in page")]
    MissingPollField {
        /// The JSON key that was searched for
        key: String,
    },

    /// The page had no working, prompting or download marker
    #[error("response not understood while running report")]
    UnrecognizedResponse,

    /// A folder listing contained a link that is neither a folder nor a report
    #[error("cannot parse {name} as a folder or as a report (href: {href})")]
    UnclassifiableLink {
        /// The link text
        name: String,
        /// The link target
        href: String,
    },

    /// NTLM negotiation could not be completed
    #[error("NTLM negotiation failed: {reason}")]
    NtlmHandshake {
        /// What went wrong
        reason: &'static str,
    },

    /// A link expected to point at a folder did not carry a folder id
    #[error("unable to find folder id in link: {link}")]
    NotAFolderLink {
        /// The offending link
        link: String,
    },
}

/// Folder path resolution errors
#[derive(Debug, Error)]
pub enum PathError {
    /// An empty path was given
    #[error("cannot get folder entry for empty path")]
    Empty,

    /// The first segment was neither "public" nor "~"
    #[error("invalid root folder {root}")]
    InvalidRoot {
        /// The segment that was given
        root: String,
    },

    /// A segment did not exist in its parent folder
    #[error("could not find folder entry {name}")]
    NotFound {
        /// The missing segment
        name: String,
    },

    /// A report appeared before the last segment
    #[error("{name} is a report and cannot contain children")]
    NotAContainer {
        /// The report segment
        name: String,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
