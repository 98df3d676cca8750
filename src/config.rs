//! Settings for the blobpager CLI
//!
//! Settings come from an optional YAML or JSON file (picked by extension)
//! with every field defaulted, then CLI flags override individual values.

use crate::blob::{validate_container_name, AccessLevel, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Complete settings for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Store location URL (see [`crate::blob::StoreLocation::parse`])
    #[serde(default = "default_store")]
    pub store: String,

    /// Explicit Azure credentials; the environment is used otherwise
    #[serde(default)]
    pub azure: AzureCredentials,

    /// Listing behaviour
    #[serde(default)]
    pub listing: ListingSettings,

    /// Quickstart scenario
    #[serde(default)]
    pub quickstart: QuickstartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: default_store(),
            azure: AzureCredentials::default(),
            listing: ListingSettings::default(),
            quickstart: QuickstartSettings::default(),
        }
    }
}

/// Per-user data directory, so separate CLI runs see the same containers
fn default_store() -> String {
    dirs::data_local_dir()
        .map_or_else(|| PathBuf::from(".blobpager"), |dir| dir.join("blobpager"))
        .display()
        .to_string()
}

impl Settings {
    /// Load settings from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read settings file {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.store.trim().is_empty() {
            return Err(Error::config("store must not be empty"));
        }
        if self.listing.page_size == 0 {
            return Err(Error::config("listing.page_size must be at least 1"));
        }
        if self.quickstart.container_prefix.is_empty() {
            return Err(Error::config("quickstart.container_prefix must not be empty"));
        }
        // Generated names append a UUID to the prefix
        let sample = format!("{}{}", self.quickstart.container_prefix, Uuid::nil());
        validate_container_name(&sample).map_err(|e| {
            Error::config(format!("quickstart.container_prefix is unusable: {e}"))
        })?;
        Ok(())
    }

    /// Azure credentials, if any were configured
    pub fn azure_credentials(&self) -> Option<&AzureCredentials> {
        (!self.azure.is_empty()).then_some(&self.azure)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Storage account name and shared key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureCredentials {
    #[serde(default)]
    pub account_name: Option<String>,

    #[serde(default)]
    pub access_key: Option<String>,
}

impl AzureCredentials {
    pub fn is_empty(&self) -> bool {
        self.account_name.is_none() && self.access_key.is_none()
    }
}

/// Listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSettings {
    /// Blobs requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Quickstart scenario settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickstartSettings {
    /// Prefix of the generated container name
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,

    /// Access level set on the container after creation
    #[serde(default = "default_access")]
    pub access: AccessLevel,

    /// Body of the uploaded blob
    #[serde(default = "default_blob_body")]
    pub blob_body: String,

    /// Directory the blob is downloaded into (defaults per platform)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for QuickstartSettings {
    fn default() -> Self {
        Self {
            container_prefix: default_container_prefix(),
            access: default_access(),
            blob_body: default_blob_body(),
            download_dir: None,
        }
    }
}

fn default_container_prefix() -> String {
    "quickstartblobs".to_string()
}

fn default_access() -> AccessLevel {
    AccessLevel::Container
}

fn default_blob_body() -> String {
    "Hello, World!".to_string()
}

impl QuickstartSettings {
    /// Download directory: configured, else Documents on Windows, else home
    pub fn resolve_download_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.download_dir {
            return Ok(dir.clone());
        }
        let dir = if cfg!(windows) {
            dirs::document_dir().or_else(dirs::home_dir)
        } else {
            dirs::home_dir()
        };
        dir.ok_or_else(|| Error::config("Could not determine a download directory"))
    }
}
