//! # cognos-dl
//!
//! Client library for driving a Cognos reporting portal through its web
//! interface: sign in, walk the folder tree, run reports and download their
//! output as CSV.
//!
//! ## Design Philosophy
//!
//! - **One session object** - a [`CognosClient`] owns the cookie jar and the
//!   request slot pool; clone it to share both across tasks
//! - **Bounded** - at most `max_concurrent_requests` requests are in flight
//!   per session, whatever the caller's load
//! - **Tolerant of a flaky portal** - network errors and spurious 401s are
//!   retried after a fixed delay, and NTLM challenges are answered
//! - **Verbatim output** - report output is returned as the exact bytes the
//!   portal sent
//! - **Strict about page format** - a page that lacks an expected marker or
//!   field fails the operation instead of being guessed at
//!
//! ## Quick Start
//!
//! ```no_run
//! use cognos_dl::{CognosClient, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(
//!         "APSCN\\0401jpenn",
//!         "password",
//!         "https://adecognos.arkansas.gov",
//!         "bentonvisms",
//!     );
//!     let client = CognosClient::new(config)?;
//!
//!     let report = client
//!         .entry_from_path(&["public", "Student Management", "Roster"])
//!         .await?;
//!     let csv = client.download_report_csv(&report.id).await?;
//!     std::io::Write::write_all(&mut std::io::stdout(), &csv)?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Request admission control
pub mod admission;
/// Portal session
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Portal link construction and parsing
pub mod links;
/// Folder listing scan
pub mod listing;
mod ntlm;
/// Report viewer page classification
pub mod report_page;
/// Fixed-delay retry logic
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use admission::{AdmissionGate, RequestSlot};
pub use client::CognosClient;
pub use config::{Config, PollConfig, RetryConfig};
pub use error::{Error, PathError, ProtocolError, Result};
pub use report_page::{PageStatus, PollFields, ReportPage};
pub use types::{EntryKind, FolderEntry, FolderListing, FolderRoots, RootFolder};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
