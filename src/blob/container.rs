//! Container client
//!
//! Blob operations scoped to one container, including the paged listing
//! that backs [`AsyncLister`].

use super::types::{
    validate_blob_name, AccessLevel, BlobItem, ContainerProperties, PROPERTIES_OBJECT,
};
use crate::error::{Error, Result};
use crate::pagination::{AsyncLister, Cursor, Page, PageFetcher};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{future, StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Default number of blobs returned per listing page
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Client for the blobs of a single container
#[derive(Debug, Clone)]
pub struct ContainerClient {
    store: Arc<dyn ObjectStore>,
    root: Option<String>,
    name: String,
    page_size: usize,
    /// Whether the store lists keys in lexicographic order
    ordered_listing: bool,
}

impl ContainerClient {
    pub(crate) fn new(
        store: Arc<dyn ObjectStore>,
        root: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            root,
            name: name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            ordered_listing: true,
        }
    }

    /// Set the number of blobs requested per listing page
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Whether listing pages can stop reading the store early
    ///
    /// Stores that list in arbitrary order (the local filesystem) need the
    /// remainder of the container read and sorted for every page.
    #[must_use]
    pub fn with_ordered_listing(mut self, ordered: bool) -> Self {
        self.ordered_listing = ordered;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ========================================================================
    // Paths
    // ========================================================================

    fn container_path(&self) -> ObjectPath {
        match &self.root {
            Some(root) => ObjectPath::from(format!("{root}/{}", self.name)),
            None => ObjectPath::from(self.name.as_str()),
        }
    }

    fn object_path(
        &self,
        name: &str,
    ) -> std::result::Result<ObjectPath, object_store::path::Error> {
        ObjectPath::parse(format!("{}/{name}", self.container_path()))
    }

    fn blob_path(&self, name: &str) -> Result<ObjectPath> {
        validate_blob_name(name)?;
        self.object_path(name)
            .map_err(|e| Error::Store(object_store::Error::from(e)))
    }

    fn properties_path(&self) -> ObjectPath {
        self.container_path().child(PROPERTIES_OBJECT)
    }

    /// Blob name of a listed object, `None` for the properties object
    fn blob_name(&self, prefix: &str, meta: &ObjectMeta) -> Option<String> {
        let name = meta.location.as_ref().strip_prefix(prefix)?.strip_prefix('/')?;
        (name != PROPERTIES_OBJECT).then(|| name.to_string())
    }

    fn not_found(&self, name: &str, err: object_store::Error) -> Error {
        match err {
            object_store::Error::NotFound { .. } => Error::blob_not_found(&self.name, name),
            other => Error::Store(other),
        }
    }

    // ========================================================================
    // Container properties
    // ========================================================================

    /// Whether the container has been created
    pub async fn exists(&self) -> Result<bool> {
        match self.store.head(&self.properties_path()).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_exists(&self) -> Result<()> {
        if self.exists().await? {
            Ok(())
        } else {
            Err(Error::container_not_found(&self.name))
        }
    }

    /// Read the container's stored properties
    pub async fn properties(&self) -> Result<ContainerProperties> {
        let data = match self.store.get(&self.properties_path()).await {
            Ok(result) => result.bytes().await?,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(Error::container_not_found(&self.name))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    pub(crate) async fn write_properties(&self, properties: &ContainerProperties) -> Result<()> {
        let data = serde_json::to_vec_pretty(properties)?;
        self.store
            .put(&self.properties_path(), Bytes::from(data).into())
            .await?;
        Ok(())
    }

    /// Change the container's public access level
    pub async fn set_access_level(&self, access: AccessLevel) -> Result<ContainerProperties> {
        let mut properties = self.properties().await?;
        properties.access = access;
        self.write_properties(&properties).await?;
        info!(container = %self.name, %access, "Set container access level");
        Ok(properties)
    }

    pub(crate) async fn delete_properties(&self) -> Result<()> {
        self.store.delete(&self.properties_path()).await?;
        Ok(())
    }

    // ========================================================================
    // Blobs
    // ========================================================================

    /// Upload a block of bytes as a blob, replacing any existing blob
    pub async fn upload_blob(&self, name: &str, data: impl Into<Bytes>) -> Result<BlobItem> {
        let path = self.blob_path(name)?;
        self.ensure_exists().await?;

        let data: Bytes = data.into();
        let size = data.len();
        self.store.put(&path, data.into()).await?;
        info!(container = %self.name, blob = name, size, "Uploaded blob");

        let meta = self.store.head(&path).await?;
        Ok(BlobItem::from_meta(name, &meta))
    }

    /// Upload a local file as a blob
    pub async fn upload_file(&self, name: &str, path: impl AsRef<Path>) -> Result<BlobItem> {
        let data = tokio::fs::read(path.as_ref()).await?;
        self.upload_blob(name, data).await
    }

    /// Look up a blob's metadata
    pub async fn blob_properties(&self, name: &str) -> Result<BlobItem> {
        let path = self.blob_path(name)?;
        let meta = self
            .store
            .head(&path)
            .await
            .map_err(|e| self.not_found(name, e))?;
        Ok(BlobItem::from_meta(name, &meta))
    }

    /// Download a blob's full contents
    pub async fn download_blob(&self, name: &str) -> Result<Bytes> {
        let path = self.blob_path(name)?;
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| self.not_found(name, e))?;
        Ok(result.bytes().await?)
    }

    /// Download a blob into a local file, returning the number of bytes written
    pub async fn download_to_file(&self, name: &str, path: impl AsRef<Path>) -> Result<u64> {
        let data = self.download_blob(name).await?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &data).await?;
        info!(container = %self.name, blob = name, path = %path.display(), "Downloaded blob");
        Ok(data.len() as u64)
    }

    /// Delete a blob
    pub async fn delete_blob(&self, name: &str) -> Result<()> {
        let path = self.blob_path(name)?;
        self.store
            .head(&path)
            .await
            .map_err(|e| self.not_found(name, e))?;
        self.store.delete(&path).await?;
        debug!(container = %self.name, blob = name, "Deleted blob");
        Ok(())
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// Fetch one page of blobs
    ///
    /// Returns at most `max_results` blobs in name order, strictly after
    /// `marker`. The returned cursor is the last name on the page when more
    /// blobs follow. On ordered stores at most `max_results + 1` blobs are
    /// read from the listing. The container's existence is checked on the first page
    /// only; every failure is reported as [`Error::FetchFailed`].
    pub async fn list_blobs_page(
        &self,
        marker: Option<&Cursor>,
        max_results: usize,
    ) -> Result<Page<BlobItem>> {
        let max_results = max_results.max(1);
        let prefix = self.container_path();

        if marker.is_none() {
            self.store
                .head(&self.properties_path())
                .await
                .map_err(|e| Error::fetch_failed(marker, e))?;
        }

        let listing = match marker {
            Some(marker) => {
                let offset = self
                    .object_path(marker.as_str())
                    .map_err(|e| Error::fetch_failed(Some(marker), e.into()))?;
                self.store.list_with_offset(Some(&prefix), &offset)
            }
            None => self.store.list(Some(&prefix)),
        };
        let wanted = max_results + 1;
        let name_prefix = prefix.as_ref();
        let mut items: Vec<BlobItem> = if self.ordered_listing {
            // Stop pulling once one blob past the page is known
            listing
                .try_filter_map(|meta| {
                    future::ready(Ok(self
                        .blob_name(name_prefix, &meta)
                        .map(|name| BlobItem::from_meta(name, &meta))))
                })
                .take(wanted)
                .try_collect::<Vec<_>>()
                .await
                .map_err(|e| Error::fetch_failed(marker, e))?
        } else {
            let mut objects: Vec<ObjectMeta> = listing
                .try_collect()
                .await
                .map_err(|e| Error::fetch_failed(marker, e))?;
            objects.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));
            objects
                .iter()
                .filter_map(|meta| {
                    self.blob_name(name_prefix, meta)
                        .map(|name| BlobItem::from_meta(name, meta))
                })
                .take(wanted)
                .collect()
        };

        let next = if items.len() > max_results {
            items.truncate(max_results);
            items.last().map(|item| Cursor::new(item.name.clone()))
        } else {
            None
        };

        debug!(
            container = %self.name,
            marker = ?marker.map(Cursor::as_str),
            items = items.len(),
            next = ?next.as_ref().map(Cursor::as_str),
            "Listed blobs page"
        );
        Ok(Page::new(items, next))
    }

    /// Lazily list every blob in the container
    pub fn list_blobs(&self) -> AsyncLister<&Self> {
        AsyncLister::new(self)
    }

    /// Resume a listing from a cursor captured earlier
    pub fn list_blobs_from(&self, cursor: Option<Cursor>) -> AsyncLister<&Self> {
        AsyncLister::resume(self, cursor)
    }
}

#[async_trait]
impl PageFetcher for ContainerClient {
    type Item = BlobItem;
    type Error = Error;

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<BlobItem>> {
        self.list_blobs_page(cursor, self.page_size).await
    }
}
