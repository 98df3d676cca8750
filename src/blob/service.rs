//! Blob service
//!
//! Container lifecycle over an object store. A container is a top-level
//! prefix holding a reserved properties object; everything else under the
//! prefix is a blob.

use super::container::{ContainerClient, DEFAULT_PAGE_SIZE};
use super::store::StoreLocation;
use super::types::{validate_container_name, AccessLevel, ContainerProperties};
use crate::error::{Error, Result};
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for container and blob operations
#[derive(Debug, Clone)]
pub struct BlobService {
    store: Arc<dyn ObjectStore>,
    root: Option<String>,
    page_size: usize,
    ordered_listing: bool,
}

impl BlobService {
    /// Create a service over a store, with containers at the store root
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            root: None,
            page_size: DEFAULT_PAGE_SIZE,
            ordered_listing: true,
        }
    }

    /// Create a service from a parsed store location
    pub fn from_location(location: &StoreLocation) -> Self {
        Self {
            store: location.store(),
            root: location.root().map(ToString::to_string),
            page_size: DEFAULT_PAGE_SIZE,
            ordered_listing: location.lists_in_order(),
        }
    }

    /// Place containers under `root` instead of the store root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into().trim_matches('/').to_string();
        self.root = (!root.is_empty()).then_some(root);
        self
    }

    /// Page size handed to every container client
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Declare whether the store lists keys in order (see
    /// [`ContainerClient::with_ordered_listing`])
    #[must_use]
    pub fn with_ordered_listing(mut self, ordered: bool) -> Self {
        self.ordered_listing = ordered;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Client for a container; performs no I/O
    pub fn container(&self, name: impl Into<String>) -> ContainerClient {
        ContainerClient::new(Arc::clone(&self.store), self.root.clone(), name)
            .with_page_size(self.page_size)
            .with_ordered_listing(self.ordered_listing)
    }

    /// Create a container with the given access level
    pub async fn create_container(
        &self,
        name: &str,
        access: AccessLevel,
    ) -> Result<ContainerClient> {
        validate_container_name(name)?;
        let container = self.container(name);
        if container.exists().await? {
            return Err(Error::ContainerExists {
                name: name.to_string(),
            });
        }

        container
            .write_properties(&ContainerProperties::new(name, access))
            .await?;
        info!(container = name, %access, "Created container");
        Ok(container)
    }

    /// Delete a container and every blob in it
    ///
    /// Returns the number of blobs deleted.
    pub async fn delete_container(&self, name: &str) -> Result<u64> {
        let container = self.container(name);
        if !container.exists().await? {
            return Err(Error::container_not_found(name));
        }

        // Deleting already-listed blobs does not disturb later pages,
        // each page starts strictly after the previous marker
        let mut deleted = 0;
        let mut blobs = container.list_blobs();
        while let Some(blob) = blobs.next().await {
            let blob = blob?;
            container.delete_blob(&blob.name).await?;
            deleted += 1;
        }
        debug!(
            container = name,
            pages = blobs.pages_fetched(),
            deleted,
            "Deleted container blobs"
        );

        container.delete_properties().await?;
        info!(container = name, deleted, "Deleted container");
        Ok(deleted)
    }

    /// List container names in name order
    pub async fn list_containers(&self) -> Result<Vec<String>> {
        let root = self.root.as_deref().map(ObjectPath::from);
        let listing = self.store.list_with_delimiter(root.as_ref()).await?;

        let mut names = Vec::new();
        for prefix in listing.common_prefixes {
            let Some(name) = prefix.filename() else {
                continue;
            };
            if validate_container_name(name).is_err() {
                continue;
            }
            if self.container(name).exists().await? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
