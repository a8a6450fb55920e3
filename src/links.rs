//! Portal link construction and parsing
//!
//! Everything the portal exposes lives behind one CGI endpoint; folders and
//! reports are addressed by query parameters carrying opaque object ids.
//! These functions are pure: they build and take apart those links and pull
//! the root folder ids out of the login page.

use crate::error::{ProtocolError, Result};
use crate::types::FolderRoots;
use regex::Regex;
use std::sync::LazyLock;

/// The portal's single CGI endpoint, also the target of report status checks
pub const PORTAL_PATH: &str = "/ibmcognos/cgi-bin/cognos.cgi";

#[allow(clippy::expect_used)]
static FOLDER_ID_IN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]m_folder=([0-9a-zA-Z-]+)").expect("folder id pattern is valid")
});

#[allow(clippy::expect_used)]
static PUBLIC_ROOT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"var g_PS_PFRootId = "([0-9a-zA-Z-]+)";"#).expect("public root pattern is valid")
});

#[allow(clippy::expect_used)]
static PERSONAL_ROOT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"var g_PS_MFRootId = "([0-9a-zA-Z-]+)";"#)
        .expect("personal root pattern is valid")
});

/// Link that must be fetched first: it sets the session cookies and its
/// page names the public and personal root folders
pub fn login_link(dsn: &str, namespace: &str) -> String {
    format!(
        "{}?dsn={}&CAMNamespace={}&b_action=xts.run&m=portal/cc.xts&gohome=",
        PORTAL_PATH,
        urlencoding::encode(dsn),
        urlencoding::encode(namespace)
    )
}

/// Link listing the contents of a folder
pub fn folder_link(id: &str) -> String {
    format!(
        "{}?b_action=xts.run&m=portal/cc.xts&m_folder={}",
        PORTAL_PATH,
        urlencoding::encode(id)
    )
}

/// Link that runs a report with CSV output and prompting disabled
pub fn report_link(id: &str) -> String {
    format!(
        "{}?b_action=cognosViewer&ui.action=run&ui.object={}&run.outputFormat=CSV&run.prompt=false",
        PORTAL_PATH,
        urlencoding::encode(id)
    )
}

/// Pull the folder id out of a folder link
///
/// Fails if the link does not address a folder, which is how folder
/// listings tell folders apart from reports.
pub fn folder_id_from_link(link: &str) -> Result<String> {
    FOLDER_ID_IN_LINK
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ProtocolError::NotAFolderLink {
                link: link.to_string(),
            }
            .into()
        })
}

/// Pull the report object id (`ui.object`) out of a report link
///
/// Accepts absolute URLs and portal-relative links. Returns `None` when the
/// link has no `ui.object` parameter.
pub fn report_id_from_link(link: &str) -> Option<String> {
    let base = url::Url::parse("http://portal.invalid").ok()?;
    let parsed = base.join(link).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "ui.object")
        .map(|(_, value)| value.into_owned())
}

/// Find the public and personal root folder ids in the login page
///
/// Each assignment must be present; when one appears more than once the
/// first occurrence wins.
pub fn find_folder_roots(page: &str) -> Result<FolderRoots> {
    let public = capture_first(&PUBLIC_ROOT_ID, page)
        .ok_or(ProtocolError::MissingRootId { root: "public" })?;
    let personal = capture_first(&PERSONAL_ROOT_ID, page)
        .ok_or(ProtocolError::MissingRootId { root: "my folders" })?;
    Ok(FolderRoots { public, personal })
}

fn capture_first(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
