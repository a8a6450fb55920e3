//! Report submission, status polling and CSV download.

use super::CognosClient;
use crate::error::{Error, ProtocolError, Result};
use crate::links::{PORTAL_PATH, report_link};
use crate::report_page::{PageStatus, ReportPage};
use reqwest::Method;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

impl CognosClient {
    /// Run a report and return its CSV output
    ///
    /// The output is the portal's CSV export byte for byte; no charset
    /// decoding or validation is applied. The report runs with its saved
    /// defaults; reports that prompt for values fail with
    /// [`Error::UnsupportedReport`]. This waits for the run to finish, which
    /// may take a long time unless a polling ceiling is configured.
    pub async fn download_report_csv(&self, id: &str) -> Result<Vec<u8>> {
        self.download_report_csv_with_cancel(id, &CancellationToken::new())
            .await
    }

    /// [`download_report_csv`](Self::download_report_csv) that gives up when `cancel` fires
    pub async fn download_report_csv_with_cancel(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        tracing::info!(report = %id, "Running report");

        let body = self
            .request_with_cancel(Method::GET, &report_link(id), "", cancel)
            .await?;
        let mut page = ReportPage::new(body);

        let started = Instant::now();
        let interval = self.config.poll_interval();
        let mut polls: u32 = 0;

        loop {
            let form = match page.status() {
                PageStatus::Working => page.poll_fields()?.to_form_body(),
                PageStatus::Prompting => {
                    tracing::warn!(report = %id, "Report prompted for additional information");
                    return Err(Error::UnsupportedReport { id: id.to_string() });
                }
                PageStatus::Ready { download_url } => {
                    tracing::info!(report = %id, polls, "Report finished, downloading output");
                    return self
                        .request_bytes_with_cancel(Method::GET, download_url, "", cancel)
                        .await;
                }
                PageStatus::Unrecognized => {
                    tracing::error!(report = %id, polls, "Portal returned a page we could not understand");
                    return Err(ProtocolError::UnrecognizedResponse.into());
                }
            };

            if self.poll_limit_reached(polls, started) {
                tracing::error!(report = %id, polls, "Report still running at polling ceiling");
                return Err(Error::PollLimitExceeded {
                    id: id.to_string(),
                    polls,
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }

            polls += 1;
            tracing::debug!(report = %id, poll = polls, "Checking report status");

            let body = self
                .request_with_cancel(Method::POST, PORTAL_PATH, &form, cancel)
                .await?;
            page = ReportPage::new(body);
        }
    }

    fn poll_limit_reached(&self, polls: u32, started: Instant) -> bool {
        let poll = &self.config.poll;
        poll.max_polls.is_some_and(|max| polls >= max)
            || poll
                .max_duration
                .is_some_and(|max| started.elapsed() >= max)
    }
}
