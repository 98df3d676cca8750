//! Blob storage types
//!
//! Descriptors returned by listings plus the container properties record
//! persisted alongside each container.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use object_store::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the reserved object holding a container's properties
pub const PROPERTIES_OBJECT: &str = ".container.json";

/// Public access level of a container
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No anonymous access
    #[default]
    Private,
    /// Anonymous read access to blobs only
    Blob,
    /// Anonymous read access to blobs and container listings
    Container,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Private => "private",
            Self::Blob => "blob",
            Self::Container => "container",
        };
        f.write_str(s)
    }
}

/// Properties stored with every container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerProperties {
    pub name: String,
    #[serde(default)]
    pub access: AccessLevel,
    pub created_at: DateTime<Utc>,
}

impl ContainerProperties {
    pub fn new(name: impl Into<String>, access: AccessLevel) -> Self {
        Self {
            name: name.into(),
            access,
            created_at: Utc::now(),
        }
    }
}

/// A blob as returned by listings and property lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobItem {
    /// Blob name, relative to its container
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

impl BlobItem {
    /// Build from object metadata, given the blob's name within its container
    pub fn from_meta(name: impl Into<String>, meta: &ObjectMeta) -> Self {
        Self {
            name: name.into(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
            e_tag: meta.e_tag.clone(),
        }
    }
}

/// Validate a container name
///
/// 3-63 characters of lowercase letters, digits and hyphens. Must start and
/// end with a letter or digit, with no consecutive hyphens.
pub fn validate_container_name(name: &str) -> Result<()> {
    let invalid = |message: &str| Err(Error::invalid_container_name(name, message));

    if !(3..=63).contains(&name.len()) {
        return invalid("must be 3-63 characters long");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("only lowercase letters, digits and hyphens are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("must start and end with a letter or digit");
    }
    if name.contains("--") {
        return invalid("consecutive hyphens are not allowed");
    }
    Ok(())
}

/// Validate a blob name and convert it to an object path segment list
///
/// The name must survive a round trip through [`ObjectPath`] unchanged so
/// that listings report the same name that was uploaded.
pub fn validate_blob_name(name: &str) -> Result<ObjectPath> {
    if name.is_empty() {
        return Err(Error::config("Blob name must not be empty"));
    }
    if name.len() > 1024 {
        return Err(Error::config(format!(
            "Blob name is longer than 1024 characters: {name}"
        )));
    }
    if name == PROPERTIES_OBJECT {
        return Err(Error::config(format!("Blob name is reserved: {name}")));
    }
    let path = ObjectPath::parse(name)
        .map_err(|e| Error::config(format!("Invalid blob name '{name}': {e}")))?;
    if path.as_ref() != name {
        return Err(Error::config(format!(
            "Invalid blob name '{name}': empty path segments are not allowed"
        )));
    }
    Ok(path)
}
