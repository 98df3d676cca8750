//! # blobpager
//!
//! Lazy, resumable listing over cursor-paginated APIs, with a small blob
//! storage client built on top of it.
//!
//! ## Features
//!
//! - **Cursor Pagination**: one fetch per page, driven lazily as items are consumed
//! - **Sync and Async**: [`pagination::Lister`] is an `Iterator`,
//!   [`pagination::AsyncLister`] converts to a `Stream`
//! - **Resumable**: the last good cursor survives failures and can be checkpointed
//! - **Blob Storage**: containers and blobs over memory, local disk, S3, GCS or Azure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blobpager::blob::{AccessLevel, BlobService, StoreLocation};
//! use blobpager::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let location = StoreLocation::parse("memory://")?;
//!     let service = BlobService::from_location(&location).with_page_size(100);
//!
//!     let container = service.create_container("photos", AccessLevel::Private).await?;
//!     container.upload_blob("cat.png", "meow").await?;
//!
//!     let mut blobs = container.list_blobs();
//!     while let Some(blob) = blobs.next().await {
//!         println!("{}", blob?.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CLI (quickstart, ls, ...)               │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────┬─────────────┴────────────┬────────────────┐
//! │    Config    │          Blob            │     State      │
//! ├──────────────┼──────────────────────────┼────────────────┤
//! │ YAML / JSON  │ Service / Container      │ Checkpoints    │
//! │ Store URL    │ object_store backends    │ Atomic writes  │
//! └──────────────┴─────────────┬────────────┴────────────────┘
//!                              │
//! ┌──────────────────────────────────────────────────────────┐
//! │        Pagination: Page, Cursor, Lister, AsyncLister     │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Cursor pagination and lazy listers
pub mod pagination;

/// Containers and blobs over object stores
pub mod blob;

/// Listing checkpoints
pub mod state;

/// Settings file
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use blob::{BlobItem, BlobService, ContainerClient, StoreLocation};
pub use config::Settings;
pub use pagination::{AsyncLister, Cursor, Lister, ListerState, Page, PageFetcher};
pub use state::CheckpointManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
