//! Checkpoint types for resumable listings
//!
//! These types are serialized to JSON and persisted between runs.

use crate::pagination::Cursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Saved progress of every listing keyed by listing name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub listings: BTreeMap<String, ListingCheckpoint>,
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ListingCheckpoint> {
        self.listings.get(key)
    }

    /// Get mutable checkpoint for a listing, creating if needed
    pub fn get_mut(&mut self, key: &str) -> &mut ListingCheckpoint {
        self.listings.entry(key.to_string()).or_default()
    }

    /// Cursor to resume a listing from
    ///
    /// `None` for unknown and completed listings, both of which start over.
    pub fn resume_cursor(&self, key: &str) -> Option<&Cursor> {
        self.listings
            .get(key)
            .filter(|l| !l.completed)?
            .cursor
            .as_ref()
    }

    pub fn remove(&mut self, key: &str) -> Option<ListingCheckpoint> {
        self.listings.remove(key)
    }
}

/// Progress of a single listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingCheckpoint {
    /// Cursor observed at the last page boundary
    #[serde(default)]
    pub cursor: Option<Cursor>,

    #[serde(default)]
    pub items_seen: u64,

    #[serde(default)]
    pub pages_fetched: u64,

    /// Whether the listing reached its final page
    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ListingCheckpoint {
    /// Record a page boundary
    pub fn record_page(&mut self, cursor: Option<Cursor>, items: u64) {
        self.completed = cursor.is_none();
        self.cursor = cursor;
        self.items_seen += items;
        self.pages_fetched += 1;
        self.updated_at = Some(Utc::now());
    }

    /// Move the resume point without counting a page
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = Some(cursor);
        self.completed = false;
        self.updated_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.cursor = None;
        self.completed = true;
        self.updated_at = Some(Utc::now());
    }
}

/// Checkpoint key for a container listing
pub fn container_key(container: &str) -> String {
    format!("container/{container}")
}
