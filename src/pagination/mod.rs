//! Pagination module
//!
//! Supports: Offset (JSON body), Cursor (query parameter)
//!
//! # Overview
//!
//! A [`Paginator`] knows how to shape the request for the current position
//! and how to advance after a response. [`PageFetcher`] drives one endpoint's
//! page loop on top of a transport and the retry policy, yielding pages lazily
//! until a short or empty page ends the sequence.

mod fetcher;
mod strategies;
mod types;

pub use fetcher::PageFetcher;
pub use strategies::{paginator_for, CursorPaginator, OffsetPaginator};
pub use types::{NextPage, PaginationState, Paginator};
