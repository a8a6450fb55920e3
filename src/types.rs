//! Core types for cognos-dl

use crate::error::{PathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a folder entry is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A container of other entries
    Folder,
    /// A runnable report (a leaf)
    Report,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Folder => write!(f, "folder"),
            EntryKind::Report => write!(f, "report"),
        }
    }
}

/// One node in the portal's content tree
///
/// Serializes as `{"type": "folder", "id": "..."}`. An unknown `type` fails
/// to deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Folder or report
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Opaque portal-assigned id
    pub id: String,
}

impl FolderEntry {
    /// A folder entry
    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Folder,
            id: id.into(),
        }
    }

    /// A report entry
    pub fn report(id: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Report,
            id: id.into(),
        }
    }

    /// True for folders
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// True for reports
    pub fn is_report(&self) -> bool {
        self.kind == EntryKind::Report
    }
}

/// Contents of one folder, keyed by display name
pub type FolderListing = BTreeMap<String, FolderEntry>;

/// Render a folder listing as JSON
pub fn listing_to_json(listing: &FolderListing) -> Result<String> {
    Ok(serde_json::to_string(listing)?)
}

/// The two root folder ids advertised by the login page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderRoots {
    /// "Public folders" root
    pub public: String,
    /// The signed-in user's "my folders" root
    pub personal: String,
}

impl FolderRoots {
    /// Id of the given root
    pub fn get(&self, root: RootFolder) -> &str {
        match root {
            RootFolder::Public => &self.public,
            RootFolder::Personal => &self.personal,
        }
    }
}

/// Which root a folder path starts from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootFolder {
    /// Public folders, written `public`
    Public,
    /// The user's own folders, written `~`
    Personal,
}

impl std::str::FromStr for RootFolder {
    type Err = PathError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "public" => Ok(RootFolder::Public),
            "~" => Ok(RootFolder::Personal),
            other => Err(PathError::InvalidRoot {
                root: other.to_string(),
            }),
        }
    }
}
