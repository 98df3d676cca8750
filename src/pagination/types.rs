//! Pagination types and traits
//!
//! Defines the cursor, page, and fetcher abstractions shared by the sync
//! and async listers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque continuation token returned by a listing API
///
/// The lister never parses or mutates a cursor; it is handed back to the
/// fetch operation exactly as the service produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw token
    pub fn into_inner(self) -> String {
        self.0
    }

    /// An empty token marks the end of a listing
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// One bounded batch of listing results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Create a page; an empty cursor is normalized to "no more pages"
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Create a page followed by more pages at `cursor`
    pub fn with_cursor(items: Vec<T>, cursor: impl Into<Cursor>) -> Self {
        Self::new(items, Some(cursor.into()))
    }

    /// Create the final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Items in server order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Cursor for the next page, if any
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    /// Whether this page ends the listing
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Split into items and continuation cursor
    pub fn into_parts(self) -> (Vec<T>, Option<Cursor>) {
        (self.items, self.next_cursor)
    }
}

/// Lister state machine
///
/// Each fetch moves `HasMore` to `HasMore` (non-empty cursor) or to
/// `Exhausted` (empty or absent cursor, or a failed fetch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListerState {
    /// Another fetch is pending
    HasMore,
    /// No further fetch will be issued
    Exhausted,
}

impl ListerState {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Async source of pages for [`super::AsyncLister`]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Item type carried by each page
    type Item: Send;
    /// Error returned by a failed fetch
    type Error: Send;

    /// Fetch the page that starts at `cursor` (`None` for the first page)
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<Self::Item>, Self::Error>;
}

#[async_trait]
impl<P: PageFetcher + ?Sized> PageFetcher for &P {
    type Item = P::Item;
    type Error = P::Error;

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<Self::Item>, Self::Error> {
        (**self).fetch_page(cursor).await
    }
}

#[async_trait]
impl<P: PageFetcher + ?Sized> PageFetcher for Arc<P> {
    type Item = P::Item;
    type Error = P::Error;

    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<Page<Self::Item>, Self::Error> {
        (**self).fetch_page(cursor).await
    }
}
