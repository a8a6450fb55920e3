//! Report viewer page classification
//!
//! After a report is submitted the portal answers with a viewer page. The page
//! says, in one of two encodings, whether the run is still working, is waiting
//! for prompt values, or has finished and points at its output. While the run
//! is working the page also carries the conversation state that the next
//! status check must echo back.

use crate::error::{ProtocolError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Markers meaning the run has not finished yet.
///
/// The portal emits either a plain JSON flag or an HTML-escaped copy of it,
/// and uses both `working` and `stillWorking`; all are authoritative.
const WORKING_MARKERS: [&str; 4] = [
    r#""m_sStatus": "working""#,
    r#""m_sStatus": "stillWorking""#,
    "&quot;m_sStatus&quot;: &quot;working&quot;",
    "&quot;m_sStatus&quot;: &quot;stillWorking&quot;",
];

/// Markers meaning the report wants prompt values
const PROMPTING_MARKERS: [&str; 2] = [
    r#""m_sStatus": "prompting""#,
    "&quot;m_sStatus&quot;: &quot;prompting&quot;",
];

#[allow(clippy::expect_used)]
static DOWNLOAD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var sURL = '([^']+)';").expect("download URL pattern is valid")
});

/// Where a report run stands according to one viewer page
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageStatus {
    /// Still running; poll again
    Working,
    /// Waiting for prompt values, which this client cannot supply
    Prompting,
    /// Finished; the output can be fetched from `download_url`
    Ready {
        /// Link to the CSV output
        download_url: String,
    },
    /// None of the known markers were present
    Unrecognized,
}

/// Classify a viewer page
///
/// Working markers take priority, then prompting, then the download link.
pub fn classify(page: &str) -> PageStatus {
    if WORKING_MARKERS.iter().any(|m| page.contains(m)) {
        return PageStatus::Working;
    }
    if PROMPTING_MARKERS.iter().any(|m| page.contains(m)) {
        return PageStatus::Prompting;
    }
    match DOWNLOAD_URL.captures(page).and_then(|caps| caps.get(1)) {
        Some(url) => PageStatus::Ready {
            download_url: url.as_str().to_string(),
        },
        None => PageStatus::Unrecognized,
    }
}

/// One viewer page together with its classification
///
/// A poll request is only ever built from the page it follows: the next page
/// replaces this one wholesale.
#[derive(Clone, Debug)]
pub struct ReportPage {
    body: String,
    status: PageStatus,
}

impl ReportPage {
    /// Classify a freshly received page
    pub fn new(body: String) -> Self {
        let status = classify(&body);
        Self { body, status }
    }

    /// The page's classification
    pub fn status(&self) -> &PageStatus {
        &self.status
    }

    /// The raw page
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Extract the state the next status check must send back
    pub fn poll_fields(&self) -> Result<PollFields> {
        PollFields::extract(&self.body)
    }
}

/// Conversation state echoed back to the portal on each status check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollFields {
    /// `b_action`
    pub b_action: String,
    /// `m_sActionState`
    pub action_state: String,
    /// `cv.id`
    pub cv_id: String,
    /// `cv.objectPermissions`
    pub object_permissions: String,
    /// `m_sParameters`
    pub execution_parameters: String,
    /// `m_sTracking`
    pub tracking: String,
    /// `m_sCAFContext`
    pub caf_context: String,
    /// `m_sConversation`
    pub conversation: String,
    /// `ui.object`
    pub object: String,
    /// `ui.objectClass`
    pub object_class: String,
    /// `ui.primaryAction`
    pub primary_action: String,
}

impl PollFields {
    /// Pull every field out of a page; any missing field is an error
    pub fn extract(page: &str) -> Result<Self> {
        let field = |key: &str| -> Result<String> {
            find_json_value(page, key).ok_or_else(|| {
                ProtocolError::MissingPollField {
                    key: key.to_string(),
                }
                .into()
            })
        };

        Ok(Self {
            b_action: field("b_action")?,
            action_state: field("m_sActionState")?,
            cv_id: field("cv.id")?,
            object_permissions: field("cv.objectPermissions")?,
            execution_parameters: field("m_sParameters")?,
            tracking: field("m_sTracking")?,
            caf_context: field("m_sCAFContext")?,
            conversation: field("m_sConversation")?,
            object: field("ui.object")?,
            object_class: field("ui.objectClass")?,
            primary_action: field("ui.primaryAction")?,
        })
    }

    /// Form-encoded body for the `ui.action=wait` status check
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("b_action", &self.b_action)
            .append_pair("cv.actionState", &self.action_state)
            .append_pair("cv.catchLogOnFault", "true")
            .append_pair("cv.id", &self.cv_id)
            .append_pair("cv.objectPermissions", &self.object_permissions)
            .append_pair("cv.responseFormat", "data")
            .append_pair("cv.showFaultPage", "true")
            .append_pair("executionParameters", &self.execution_parameters)
            .append_pair("m_tracking", &self.tracking)
            .append_pair("ui.action", "wait")
            .append_pair("ui.cafcontextid", &self.caf_context)
            .append_pair("ui.conversation", &self.conversation)
            .append_pair("ui.object", &self.object)
            .append_pair("ui.objectClass", &self.object_class)
            .append_pair("ui.primaryAction", &self.primary_action)
            .finish()
    }
}

/// Find the value of `"key": "value"` in a page
///
/// Tries the plain encoding first, then the HTML-escaped one. The value ends
/// at the first closing quote on the same line.
pub fn find_json_value(page: &str, key: &str) -> Option<String> {
    find_quoted(page, &format!(r#""{}": ""#, key), "\"").or_else(|| {
        find_quoted(
            page,
            &format!("&quot;{}&quot;: &quot;", key),
            "&quot;",
        )
    })
}

fn find_quoted(page: &str, opener: &str, closer: &str) -> Option<String> {
    page.match_indices(opener).find_map(|(start, _)| {
        let rest = &page[start + opener.len()..];
        let end = rest.find(closer)?;
        let value = &rest[..end];
        (!value.contains('\n')).then(|| value.to_string())
    })
}
