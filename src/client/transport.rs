//! Bounded, retrying portal requests.

use super::CognosClient;
use crate::error::{Error, Result};
use crate::ntlm::{self, AuthScheme};
use crate::retry::{RetryFailure, with_retry};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::future::Future;
use tokio_util::sync::CancellationToken;

impl CognosClient {
    /// Send a request to the portal and return the response body as text
    ///
    /// `link` is either a path on the portal (joined to the base URL) or an
    /// absolute URL, which is used as-is. A non-empty `body` is sent
    /// form-encoded.
    ///
    /// One request slot is held for the whole call, retries included. Network
    /// errors and 401 responses are retried after the configured delay; any
    /// other non-200 status fails immediately. A 401 that offers NTLM is
    /// answered with an NTLM handshake before it counts as a failure.
    pub async fn request(&self, method: Method, link: &str, body: &str) -> Result<String> {
        self.request_with_cancel(method, link, body, &CancellationToken::new())
            .await
    }

    /// [`request`](Self::request) that gives up when `cancel` fires
    ///
    /// Cancellation is observed while waiting for a request slot and while
    /// waiting between attempts.
    pub async fn request_with_cancel(
        &self,
        method: Method,
        link: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.execute(method, link, body, cancel, |response| response.text())
            .await
    }

    /// [`request`](Self::request) returning the body exactly as sent, with no
    /// charset decoding
    pub async fn request_bytes(&self, method: Method, link: &str, body: &str) -> Result<Vec<u8>> {
        self.request_bytes_with_cancel(method, link, body, &CancellationToken::new())
            .await
    }

    /// [`request_bytes`](Self::request_bytes) that gives up when `cancel` fires
    pub async fn request_bytes_with_cancel(
        &self,
        method: Method,
        link: &str,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        self.execute(method, link, body, cancel, |response| async move {
            response.bytes().await.map(|bytes| bytes.to_vec())
        })
        .await
    }

    /// Admission, retries and error mapping around one logical request
    ///
    /// Reading the body happens inside the retried attempt, so a connection
    /// dropped mid-body is retried like any other network error.
    async fn execute<T, R, Fut>(
        &self,
        method: Method,
        link: &str,
        body: &str,
        cancel: &CancellationToken,
        read: R,
    ) -> Result<T>
    where
        R: Fn(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let _slot = self.gate.acquire(cancel).await?;
        let url = self.resolve_url(link);
        let url = url.as_str();
        let read = &read;

        let result = with_retry(&self.config.retry, cancel, || {
            let method = method.clone();
            async move {
                let response = self.attempt(method, url, link, body).await?;
                Ok::<T, Error>(read(response).await?)
            }
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(RetryFailure::Permanent(e)) => Err(e),
            Err(RetryFailure::Exhausted {
                attempts,
                last_error,
            }) => Err(Error::RetriesExhausted {
                path: link.to_string(),
                attempts,
                last_error: Box::new(last_error),
            }),
            Err(RetryFailure::Cancelled) => Err(Error::Cancelled),
        }
    }

    /// One HTTP exchange (plus any NTLM handshake), no retries
    async fn attempt(&self, method: Method, url: &str, link: &str, body: &str) -> Result<Response> {
        tracing::debug!(method = %method, path = %link, "Sending portal request");

        let mut response = self
            .build(method.clone(), url, body)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(scheme) = ntlm::offered_scheme(response.headers()) {
                response = self
                    .negotiate_ntlm(scheme, method, url, link, body, response)
                    .await?;
            }
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The portal returns these at random during normal operation
            tracing::warn!(
                path = %link,
                "Portal returned 401 Unauthorized; bad password or a spurious rejection"
            );
            return Err(Error::Unauthorized {
                path: link.to_string(),
            });
        }
        if status != StatusCode::OK {
            tracing::error!(path = %link, status = status.as_u16(), "Portal returned an error status");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                path: link.to_string(),
            });
        }

        Ok(response)
    }

    /// Answer an NTLM challenge: negotiate, read the server challenge, authenticate
    ///
    /// Returns the response to the final request; a 401 there is left for
    /// the caller to treat like any other 401.
    async fn negotiate_ntlm(
        &self,
        scheme: AuthScheme,
        method: Method,
        url: &str,
        link: &str,
        body: &str,
        offer: Response,
    ) -> Result<Response> {
        tracing::debug!(path = %link, scheme = scheme.as_str(), "Portal requested NTLM authentication");
        // Drained so the pooled connection can carry the handshake
        offer.bytes().await.ok();

        let negotiate = ntlm::negotiate_message()?;
        let response = self
            .build(method.clone(), url, body)
            .header(AUTHORIZATION, scheme.header_value(&negotiate))
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(challenge) = ntlm::challenge_token(response.headers(), scheme) else {
            tracing::warn!(path = %link, "Portal rejected the NTLM negotiate message");
            return Ok(response);
        };
        response.bytes().await.ok();

        let authenticate =
            ntlm::authenticate_message(&challenge, &self.config.username, &self.config.password)?;
        Ok(self
            .build(method, url, body)
            .header(AUTHORIZATION, scheme.header_value(&authenticate))
            .send()
            .await?)
    }

    /// Request with the body attached, no credentials yet
    fn build(&self, method: Method, url: &str, body: &str) -> RequestBuilder {
        let request = self.http.request(method, url);
        if body.is_empty() {
            request
        } else {
            request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string())
        }
    }

    /// Absolute URL for a portal link
    pub(crate) fn resolve_url(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else if link.starts_with('/') {
            format!("{}{}", self.config.base_url_trimmed(), link)
        } else {
            format!("{}/{}", self.config.base_url_trimmed(), link)
        }
    }
}
