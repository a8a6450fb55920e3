//! Session cookie jar with optional public suffix rejection.

use crate::error::{Error, Result};
use reqwest::header::HeaderValue;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cookie jar shared by every request of one session
///
/// With a public suffix list loaded, a `Set-Cookie` whose `Domain` is a
/// public suffix (for example `Domain=com`) is dropped unless it names the
/// request host itself.
#[derive(Debug, Default)]
pub(crate) struct SessionCookies {
    store: RwLock<cookie_store::CookieStore>,
}

impl SessionCookies {
    /// Jar that enforces the given public suffix list
    pub(crate) fn with_suffix_list(list: publicsuffix::List) -> Self {
        Self {
            store: RwLock::new(cookie_store::CookieStore::default().with_suffix_list(list)),
        }
    }

    /// Load a jar for the configured public suffix list file, if any
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                format!("cannot read public suffix list {}: {}", path.display(), e),
                "public_suffix_list",
            )
        })?;
        let list: publicsuffix::List = text.parse().map_err(|e| {
            Error::config(
                format!("invalid public suffix list {}: {:?}", path.display(), e),
                "public_suffix_list",
            )
        })?;

        tracing::debug!(path = %path.display(), "Loaded public suffix list");
        Ok(Self::with_suffix_list(list))
    }

    // A panic while holding the lock leaves the store itself consistent
    fn read(&self) -> RwLockReadGuard<'_, cookie_store::CookieStore> {
        self.store.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, cookie_store::CookieStore> {
        self.store.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl reqwest::cookie::CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &url::Url) {
        let cookies = cookie_headers.filter_map(|value| {
            let text = value.to_str().ok()?;
            cookie::Cookie::parse(text).ok().map(|c| c.into_owned())
        });
        self.write().store_response_cookies(cookies, url);
    }

    fn cookies(&self, url: &url::Url) -> Option<HeaderValue> {
        let header = self
            .read()
            .get_request_values(url)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;
    use std::io::Write;

    const SUFFIXES: &str = "// ===BEGIN ICANN DOMAINS===\ncom\norg\n// ===END ICANN DOMAINS===\n";

    fn offer(jar: &SessionCookies, set_cookie: &str, url: &url::Url) {
        let header = HeaderValue::from_str(set_cookie).unwrap();
        jar.set_cookies(&mut std::iter::once(&header), url);
    }

    #[test]
    fn host_cookies_round_trip() {
        let jar = SessionCookies::default();
        let url = url::Url::parse("https://portal.example.org/ibmcognos/").unwrap();
        offer(&jar, "cam_passport=abc; Path=/", &url);
        offer(&jar, "userSessionID=42; Path=/", &url);

        let header = jar.cookies(&url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("cam_passport=abc"));
        assert!(header.contains("userSessionID=42"));
    }

    #[test]
    fn public_suffix_domain_is_rejected_with_list() {
        let url = url::Url::parse("https://portal.com/").unwrap();

        let permissive = SessionCookies::default();
        offer(&permissive, "tracker=1; Domain=com; Path=/", &url);
        assert!(permissive.cookies(&url).is_some());

        let strict = SessionCookies::with_suffix_list(SUFFIXES.parse().unwrap());
        offer(&strict, "tracker=1; Domain=com; Path=/", &url);
        assert!(strict.cookies(&url).is_none());

        offer(&strict, "session=2; Path=/", &url);
        assert_eq!(strict.cookies(&url).unwrap().to_str().unwrap(), "session=2");
    }

    #[test]
    fn load_reads_list_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SUFFIXES.as_bytes()).unwrap();

        let jar = SessionCookies::load(Some(file.path())).unwrap();
        let url = url::Url::parse("https://portal.org/").unwrap();
        offer(&jar, "tracker=1; Domain=org", &url);
        assert!(jar.cookies(&url).is_none());
    }

    #[test]
    fn load_without_path_is_permissive() {
        assert!(SessionCookies::load(None).is_ok());
    }

    #[test]
    fn load_reports_missing_file_as_config_error() {
        match SessionCookies::load(Some(Path::new("/nonexistent/public_suffix_list.dat"))) {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("public_suffix_list"))
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
