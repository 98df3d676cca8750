//! Pagination module
//!
//! Lazy, resumable listing over cursor-paginated APIs.
//!
//! # Overview
//!
//! A listing API returns one bounded [`Page`] per request together with an
//! opaque [`Cursor`] naming where the next page starts. The listers in this
//! module turn that request/response loop into a pull-based sequence of
//! items:
//!
//! - [`Lister`] - synchronous [`Iterator`] over a fetch closure
//! - [`AsyncLister`] - async variant over a [`PageFetcher`], convertible to a
//!   [`futures::Stream`]
//!
//! An absent or empty cursor ends the listing; item counts never do.

mod lister;
mod types;

pub use lister::{AsyncLister, Lister};
pub use types::{Cursor, ListerState, Page, PageFetcher};
