//! Error types for blobpager
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! The generic [`crate::pagination::Lister`] surfaces whatever error its
//! fetch operation returns; for blob listings that is [`Error::FetchFailed`].

use crate::pagination::Cursor;
use thiserror::Error;

/// The main error type for blobpager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Listing Errors
    // ============================================================================
    #[error("Failed to fetch page (cursor: {}): {source}", display_cursor(.cursor))]
    FetchFailed {
        cursor: Option<Cursor>,
        #[source]
        source: object_store::Error,
    },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Container already exists: {name}")]
    ContainerExists { name: String },

    #[error("Container not found: {name}")]
    ContainerNotFound { name: String },

    #[error("Blob not found: {container}/{name}")]
    BlobNotFound { container: String, name: String },

    #[error("Invalid container name '{name}': {message}")]
    InvalidContainerName { name: String, message: String },

    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid store URL '{url}': {message}")]
    InvalidStoreUrl { url: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

fn display_cursor(cursor: &Option<Cursor>) -> &str {
    cursor.as_ref().map_or("<start>", Cursor::as_str)
}

impl Error {
    /// Create a fetch failure for the page requested with `cursor`
    pub fn fetch_failed(cursor: Option<&Cursor>, source: object_store::Error) -> Self {
        Self::FetchFailed {
            cursor: cursor.cloned(),
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid store URL error
    pub fn invalid_store_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidStoreUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a container-not-found error
    pub fn container_not_found(name: impl Into<String>) -> Self {
        Self::ContainerNotFound { name: name.into() }
    }

    /// Create a blob-not-found error
    pub fn blob_not_found(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::BlobNotFound {
            container: container.into(),
            name: name.into(),
        }
    }

    /// Create an invalid container name error
    pub fn invalid_container_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidContainerName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Check if this error is a page fetch failure
    pub fn is_fetch_failed(&self) -> bool {
        matches!(self, Self::FetchFailed { .. })
    }

    /// Check if this error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ContainerNotFound { .. } | Self::BlobNotFound { .. } => true,
            Self::Store(object_store::Error::NotFound { .. }) => true,
            Self::FetchFailed {
                source: object_store::Error::NotFound { .. },
                ..
            } => true,
            _ => false,
        }
    }
}

/// Result type alias for blobpager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
