//! Root discovery, folder listing and path resolution.

use super::CognosClient;
use crate::error::{PathError, Result};
use crate::links::{find_folder_roots, folder_link, login_link};
use crate::listing::parse_folder_listing;
use crate::types::{FolderEntry, FolderListing, FolderRoots, RootFolder};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

impl CognosClient {
    /// Fetch the login page and read the public and personal root folder ids
    ///
    /// This is also the request that establishes the session cookies.
    pub async fn folder_roots(&self) -> Result<FolderRoots> {
        self.folder_roots_with_cancel(&CancellationToken::new())
            .await
    }

    /// [`folder_roots`](Self::folder_roots) that gives up when `cancel` fires
    pub async fn folder_roots_with_cancel(&self, cancel: &CancellationToken) -> Result<FolderRoots> {
        let link = login_link(&self.config.dsn, &self.config.namespace);
        let page = self
            .request_with_cancel(Method::GET, &link, "", cancel)
            .await?;
        let roots = find_folder_roots(&page)?;
        tracing::debug!(public = %roots.public, personal = %roots.personal, "Found root folders");
        Ok(roots)
    }

    /// List the contents of a folder, keyed by entry name
    pub async fn list_folder(&self, id: &str) -> Result<FolderListing> {
        self.list_folder_with_cancel(id, &CancellationToken::new())
            .await
    }

    /// [`list_folder`](Self::list_folder) that gives up when `cancel` fires
    pub async fn list_folder_with_cancel(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<FolderListing> {
        let page = self
            .request_with_cancel(Method::GET, &folder_link(id), "", cancel)
            .await?;
        let entries = parse_folder_listing(&page)?;
        tracing::debug!(folder = %id, entries = entries.len(), "Listed folder");
        Ok(entries)
    }

    /// Resolve a path such as `["public", "District", "Roster"]` to an entry
    ///
    /// The first segment is `public` for public folders or `~` for the
    /// signed-in user's folders; each later segment names a child of the
    /// previous one. Only the last segment may be a report.
    pub async fn entry_from_path(&self, path: &[&str]) -> Result<FolderEntry> {
        self.entry_from_path_with_cancel(path, &CancellationToken::new())
            .await
    }

    /// [`entry_from_path`](Self::entry_from_path) that gives up when `cancel` fires
    ///
    /// The token covers every request of the walk.
    pub async fn entry_from_path_with_cancel(
        &self,
        path: &[&str],
        cancel: &CancellationToken,
    ) -> Result<FolderEntry> {
        let (root, rest) = path.split_first().ok_or(PathError::Empty)?;
        let root: RootFolder = root.parse()?;

        let roots = self.folder_roots_with_cancel(cancel).await?;
        let mut current = FolderEntry::folder(roots.get(root));

        for (i, name) in rest.iter().enumerate() {
            let mut entries = self.list_folder_with_cancel(&current.id, cancel).await?;
            let next = entries.remove(*name).ok_or_else(|| PathError::NotFound {
                name: name.to_string(),
            })?;

            let is_last = i + 1 == rest.len();
            if next.is_report() && !is_last {
                return Err(PathError::NotAContainer {
                    name: name.to_string(),
                }
                .into());
            }

            current = next;
        }

        Ok(current)
    }
}
