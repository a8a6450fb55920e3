//! Folder listing scan
//!
//! A folder page renders each child as an anchor inside a
//! `<td class="tableText">` cell. Folder anchors carry `m_folder=<id>`,
//! report anchors carry `ui.object=<id>`.

use crate::error::{ProtocolError, Result};
use crate::links::{folder_id_from_link, report_id_from_link};
use crate::types::{FolderEntry, FolderListing};
use scraper::{Html, Selector};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static LISTING_ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td.tableText a[href]").expect("listing selector is valid")
});

/// Scan a folder page into a map of entry name to entry
///
/// Entry names are the anchors' text with markup removed, character
/// references decoded and whitespace collapsed. A later entry with the same
/// name replaces an earlier one. Any anchor in a listing cell that is neither
/// a folder nor a report link fails the whole scan.
pub fn parse_folder_listing(page: &str) -> Result<FolderListing> {
    let document = Html::parse_document(page);
    let mut entries = FolderListing::new();

    for anchor in document.select(&LISTING_ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default();
        let name = anchor
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        let entry = classify_link(&name, href)?;
        tracing::trace!(name = %name, kind = %entry.kind, id = %entry.id, "Listed entry");
        entries.insert(name, entry);
    }

    Ok(entries)
}

/// Decide whether a listing link is a folder or a report
pub fn classify_link(name: &str, href: &str) -> Result<FolderEntry> {
    if let Ok(id) = folder_id_from_link(href) {
        return Ok(FolderEntry::folder(id));
    }
    if let Some(id) = report_id_from_link(href) {
        return Ok(FolderEntry::report(id));
    }
    Err(ProtocolError::UnclassifiableLink {
        name: name.to_string(),
        href: href.to_string(),
    }
    .into())
}
