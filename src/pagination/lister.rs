//! Lazy listers over cursor-paged listings
//!
//! [`Lister`] drives a synchronous fetch closure and is an [`Iterator`];
//! [`AsyncLister`] drives a [`PageFetcher`] and can be turned into a
//! [`futures::Stream`]. Both share the same cursor bookkeeping.

use super::types::{Cursor, ListerState, Page, PageFetcher};
use futures::Stream;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::debug;

// ============================================================================
// Shared state
// ============================================================================

/// Cursor bookkeeping shared by both listers
#[derive(Debug)]
struct ListerCore<T> {
    state: ListerState,
    /// Latest observed cursor: the starting cursor, then each page's cursor
    cursor: Option<Cursor>,
    /// Cursor that produced the page currently buffered
    page_cursor: Option<Cursor>,
    buffer: VecDeque<T>,
    pages_fetched: u64,
    items_yielded: u64,
    failed: bool,
}

impl<T> ListerCore<T> {
    fn new(start: Option<Cursor>) -> Self {
        let start = start.filter(|c| !c.is_empty());
        Self {
            state: ListerState::HasMore,
            page_cursor: start.clone(),
            cursor: start,
            buffer: VecDeque::new(),
            pages_fetched: 0,
            items_yielded: 0,
            failed: false,
        }
    }

    /// Next buffered item, if the current page still has one
    fn pop(&mut self) -> Option<T> {
        let item = self.buffer.pop_front()?;
        self.items_yielded += 1;
        Some(item)
    }

    /// Whether a fetch must be issued before anything else can be yielded
    fn needs_fetch(&self) -> bool {
        self.buffer.is_empty() && self.state == ListerState::HasMore
    }

    fn accept(&mut self, page: Page<T>) {
        self.pages_fetched += 1;
        let (items, next) = page.into_parts();
        debug!(
            page = self.pages_fetched,
            cursor = ?self.cursor.as_ref().map(Cursor::as_str),
            items = items.len(),
            has_more = next.is_some(),
            "Fetched page"
        );

        self.page_cursor = self.cursor.take();
        self.buffer.extend(items);
        match next {
            Some(cursor) => self.cursor = Some(cursor),
            None => self.state = ListerState::Exhausted,
        }
    }

    fn fail(&mut self) {
        debug!(
            cursor = ?self.cursor.as_ref().map(Cursor::as_str),
            "Page fetch failed, listing stopped"
        );
        self.state = ListerState::Exhausted;
        self.failed = true;
    }

    fn resume_cursor(&self) -> Option<&Cursor> {
        if self.buffer.is_empty() {
            self.cursor.as_ref()
        } else {
            self.page_cursor.as_ref()
        }
    }
}

// ============================================================================
// Sync Lister
// ============================================================================

/// Lazy iterator over every item of a cursor-paged listing
///
/// Issues exactly one call to `fetch` per page, strictly in sequence, and
/// stops once a page comes back without a cursor (or with an empty one).
/// A page with no items but a cursor keeps the listing going.
///
/// A failed fetch is yielded once as `Err`, after which the iterator is
/// finished. [`Lister::cursor`] still holds the last good cursor, so a
/// fresh lister can pick up where this one stopped.
///
/// ```
/// use blobpager::pagination::{Cursor, Lister, Page};
///
/// let mut pages = vec![
///     Page::with_cursor(vec!["a", "b"], "tok1"),
///     Page::last(vec!["c"]),
/// ]
/// .into_iter();
/// let lister = Lister::new(|_cursor: Option<&Cursor>| {
///     Ok::<_, std::convert::Infallible>(pages.next().unwrap())
/// });
///
/// let items: Vec<_> = lister.map(Result::unwrap).collect();
/// assert_eq!(items, vec!["a", "b", "c"]);
/// ```
pub struct Lister<T, F> {
    fetch: F,
    core: ListerCore<T>,
}

impl<T, E, F> Lister<T, F>
where
    F: FnMut(Option<&Cursor>) -> Result<Page<T>, E>,
{
    /// List from the beginning
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            core: ListerCore::new(None),
        }
    }

    /// Resume a listing from a previously observed cursor
    pub fn resume(fetch: F, cursor: Option<Cursor>) -> Self {
        Self {
            fetch,
            core: ListerCore::new(cursor),
        }
    }
}

impl<T, F> Lister<T, F> {
    /// Latest cursor observed at a page boundary
    pub fn cursor(&self) -> Option<&Cursor> {
        self.core.cursor.as_ref()
    }

    /// Cursor from which every item not yet yielded can be fetched again
    ///
    /// Equal to [`Lister::cursor`] at a page boundary. Mid-page it is the
    /// cursor of the current page, so resuming from it repeats the items
    /// of that page already yielded.
    pub fn resume_cursor(&self) -> Option<&Cursor> {
        self.core.resume_cursor()
    }

    pub fn state(&self) -> ListerState {
        self.core.state
    }

    /// Number of fetch calls issued so far
    pub fn pages_fetched(&self) -> u64 {
        self.core.pages_fetched
    }

    pub fn items_yielded(&self) -> u64 {
        self.core.items_yielded
    }

    /// Whether every item of the current page has been yielded
    pub fn at_page_boundary(&self) -> bool {
        self.core.buffer.is_empty()
    }

    /// Whether the listing stopped because a fetch failed
    pub fn failed(&self) -> bool {
        self.core.failed
    }

    /// Whether the listing ran to its final page
    pub fn is_complete(&self) -> bool {
        self.core.state.is_exhausted() && !self.core.failed && self.core.buffer.is_empty()
    }
}

impl<T, E, F> Iterator for Lister<T, F>
where
    F: FnMut(Option<&Cursor>) -> Result<Page<T>, E>,
{
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.core.pop() {
                return Some(Ok(item));
            }
            if !self.core.needs_fetch() {
                return None;
            }
            match (self.fetch)(self.core.cursor.as_ref()) {
                Ok(page) => self.core.accept(page),
                Err(e) => {
                    self.core.fail();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<T, E, F> FusedIterator for Lister<T, F> where F: FnMut(Option<&Cursor>) -> Result<Page<T>, E> {}

// ============================================================================
// Async Lister
// ============================================================================

/// Async counterpart of [`Lister`], driven by a [`PageFetcher`]
pub struct AsyncLister<P: PageFetcher> {
    fetcher: P,
    core: ListerCore<P::Item>,
}

impl<P: PageFetcher> AsyncLister<P> {
    /// List from the beginning
    pub fn new(fetcher: P) -> Self {
        Self {
            fetcher,
            core: ListerCore::new(None),
        }
    }

    /// Resume a listing from a previously observed cursor
    pub fn resume(fetcher: P, cursor: Option<Cursor>) -> Self {
        Self {
            fetcher,
            core: ListerCore::new(cursor),
        }
    }

    /// Next item, fetching the next page when the current one is used up
    pub async fn next(&mut self) -> Option<Result<P::Item, P::Error>> {
        loop {
            if let Some(item) = self.core.pop() {
                return Some(Ok(item));
            }
            if !self.core.needs_fetch() {
                return None;
            }
            match self.fetcher.fetch_page(self.core.cursor.as_ref()).await {
                Ok(page) => self.core.accept(page),
                Err(e) => {
                    self.core.fail();
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drain the listing into a vector, stopping at the first failure
    pub async fn try_collect(mut self) -> Result<Vec<P::Item>, P::Error> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    /// Convert into a stream of items
    pub fn into_stream(self) -> impl Stream<Item = Result<P::Item, P::Error>> {
        futures::stream::unfold(self, |mut lister| async move {
            let item = lister.next().await?;
            Some((item, lister))
        })
    }

    /// Latest cursor observed at a page boundary
    pub fn cursor(&self) -> Option<&Cursor> {
        self.core.cursor.as_ref()
    }

    /// See [`Lister::resume_cursor`]
    pub fn resume_cursor(&self) -> Option<&Cursor> {
        self.core.resume_cursor()
    }

    pub fn state(&self) -> ListerState {
        self.core.state
    }

    pub fn pages_fetched(&self) -> u64 {
        self.core.pages_fetched
    }

    pub fn items_yielded(&self) -> u64 {
        self.core.items_yielded
    }

    pub fn at_page_boundary(&self) -> bool {
        self.core.buffer.is_empty()
    }

    pub fn failed(&self) -> bool {
        self.core.failed
    }

    pub fn is_complete(&self) -> bool {
        self.core.state.is_exhausted() && !self.core.failed && self.core.buffer.is_empty()
    }

    pub fn fetcher(&self) -> &P {
        &self.fetcher
    }
}
