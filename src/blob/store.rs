//! Object store selection from a location URL (memory, local, S3, GCS, Azure)

use crate::config::AzureCredentials;
use crate::error::{Error, Result};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Backing store parsed from a location URL
#[derive(Debug, Clone)]
pub struct StoreLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path within the bucket/container under which containers live
    root: Option<String>,
    /// Original URL scheme for logging
    scheme: String,
}

impl StoreLocation {
    /// Parse a location URL and create the matching object store
    ///
    /// Supported formats:
    /// - `memory://` - in-process store, lost on exit
    /// - `s3://bucket/path/` - AWS S3 (credentials from `AWS_*` env vars)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///local/path/`, `/local/path/` or `./path/` - Local filesystem
    pub fn parse(location: &str) -> Result<Self> {
        Self::parse_with(location, None)
    }

    /// Parse a location URL, passing explicit Azure credentials if given
    pub fn parse_with(location: &str, azure: Option<&AzureCredentials>) -> Result<Self> {
        if !location.contains("://") {
            return Self::local(PathBuf::from(location));
        }

        let url = Url::parse(location)?;
        match url.scheme() {
            "memory" => Ok(Self::memory()),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::invalid_store_url(location, "not a local path"))?;
                Self::local(path)
            }
            "s3" => Self::s3(location, &url),
            "gs" => Self::gcs(location, &url),
            "az" => Self::azure(location, &url, azure),
            other => Err(Error::invalid_store_url(
                location,
                format!("unsupported scheme '{other}'"),
            )),
        }
    }

    /// In-memory store
    pub fn memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            root: None,
            scheme: "memory".to_string(),
        }
    }

    /// Wrap an existing store
    pub fn from_store(store: Arc<dyn ObjectStore>, root: Option<String>) -> Self {
        Self {
            store,
            root: root.filter(|r| !r.is_empty()),
            scheme: "custom".to_string(),
        }
    }

    fn s3(location: &str, url: &Url) -> Result<Self> {
        let bucket = bucket_name(location, url)?;
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: root_prefix(url),
            scheme: "s3".to_string(),
        })
    }

    fn gcs(location: &str, url: &Url) -> Result<Self> {
        let bucket = bucket_name(location, url)?;
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: root_prefix(url),
            scheme: "gs".to_string(),
        })
    }

    fn azure(location: &str, url: &Url, credentials: Option<&AzureCredentials>) -> Result<Self> {
        let container = bucket_name(location, url)?;
        let mut builder = MicrosoftAzureBuilder::from_env().with_container_name(container);
        if let Some(credentials) = credentials {
            if let Some(account) = &credentials.account_name {
                builder = builder.with_account(account);
            }
            if let Some(key) = &credentials.access_key {
                builder = builder.with_access_key(key);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: root_prefix(url),
            scheme: "az".to_string(),
        })
    }

    fn local(path: PathBuf) -> Result<Self> {
        // Create directory if it doesn't exist
        std::fs::create_dir_all(&path).map_err(|e| {
            Error::config(format!("Failed to create directory {}: {e}", path.display()))
        })?;

        let store = LocalFileSystem::new_with_prefix(&path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            root: None,
            scheme: "file".to_string(),
        })
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Base path under which containers are created
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Get the scheme (memory, file, s3, gs, az, custom)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Whether listings come back in key order
    ///
    /// The local filesystem walks directories in arbitrary order; memory and
    /// the cloud stores list lexicographically.
    pub fn lists_in_order(&self) -> bool {
        self.scheme != "file"
    }

    /// Check if this is a cloud store (not local or in-memory)
    pub fn is_cloud(&self) -> bool {
        matches!(self.scheme.as_str(), "s3" | "gs" | "az")
    }
}

fn bucket_name<'a>(location: &str, url: &'a Url) -> Result<&'a str> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::invalid_store_url(location, "missing bucket name"))
}

fn root_prefix(url: &Url) -> Option<String> {
    let trimmed = url.path().trim_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
