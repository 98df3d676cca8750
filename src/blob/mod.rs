//! Blob storage module
//!
//! Containers and blobs on top of [`object_store`].
//!
//! # Overview
//!
//! - [`StoreLocation`] - picks a backing store from a URL
//! - [`BlobService`] - creates, lists and deletes containers
//! - [`ContainerClient`] - uploads, downloads, deletes and lists blobs
//!
//! Blob listings are paged with the blob name as continuation marker and
//! consumed through [`crate::pagination::AsyncLister`].

mod container;
mod service;
mod store;
mod types;

pub use container::{ContainerClient, DEFAULT_PAGE_SIZE};
pub use service::BlobService;
pub use store::StoreLocation;
pub use types::{
    validate_blob_name, validate_container_name, AccessLevel, BlobItem, ContainerProperties,
    PROPERTIES_OBJECT,
};

#[cfg(test)]
mod tests;
