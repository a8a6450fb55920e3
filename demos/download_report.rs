//! Download a report as CSV
//!
//! Usage:
//!
//! ```text
//! COGNOS_URL=https://adecognos.arkansas.gov COGNOS_USER='APSCN\0401jpenn' \
//! COGNOS_PASSWORD=... COGNOS_DSN=bentonvisms \
//! cargo run --example download_report -- "public/Student Management/Roster"
//! ```
//!
//! The CSV is written to stdout; logs go to stderr (set `RUST_LOG` to tune).

use cognos_dl::{CancellationToken, CognosClient, Config};
use std::io::Write;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cognos_dl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let report_path = std::env::args()
        .nth(1)
        .ok_or("usage: download_report <root/folder/.../report>")?;

    let mut config = Config::new(
        std::env::var("COGNOS_USER")?,
        std::env::var("COGNOS_PASSWORD")?,
        std::env::var("COGNOS_URL")?,
        std::env::var("COGNOS_DSN")?,
    );
    config.retry.delay = Duration::from_secs(3);
    config.retry.max_retries = 5;
    config.max_concurrent_requests = 2;
    config.poll.max_duration = Some(Duration::from_secs(30 * 60));

    let client = CognosClient::new(config)?;

    // Ctrl+C abandons the run cleanly
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    // Show the public root so the caller can find their way around
    let roots = client.folder_roots_with_cancel(&cancel).await?;
    let top = client.list_folder_with_cancel(&roots.public, &cancel).await?;
    eprintln!("Public folders:");
    for (name, entry) in &top {
        eprintln!("  [{}] {}", entry.kind, name);
    }

    let segments: Vec<&str> = report_path.split('/').collect();
    let report = client
        .entry_from_path_with_cancel(&segments, &cancel)
        .await?;
    if !report.is_report() {
        return Err(format!("{} is a folder, not a report", report_path).into());
    }

    let csv = client
        .download_report_csv_with_cancel(&report.id, &cancel)
        .await?;
    std::io::stdout().write_all(&csv)?;

    Ok(())
}
