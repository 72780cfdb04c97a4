//! Page position and the strategy trait

use crate::http::HttpRequest;
use crate::types::JsonValue;

/// What the fetcher does after a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Request again from the advanced position
    Continue,
    /// The listing is exhausted
    Done,
}

impl NextPage {
    /// The listing is exhausted
    pub fn is_done(&self) -> bool {
        *self == Self::Done
    }

    /// Another page follows
    pub fn is_continue(&self) -> bool {
        *self == Self::Continue
    }
}

/// Position within one endpoint listing
///
/// Offset strategies move `offset`, token strategies move `cursor`. Both
/// count pages and records so the fetcher can enforce its page ceiling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Records skipped so far
    pub offset: u64,
    /// Continuation token from the last page, if any
    pub cursor: Option<String>,
    /// Pages fetched
    pub pages: u32,
    /// Records seen across all pages
    pub records: u64,
    /// No further request will be made
    pub done: bool,
}

impl PaginationState {
    /// Position before the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop paging
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Skip past `amount` more records
    pub fn add_offset(&mut self, amount: u64) {
        self.offset += amount;
    }

    /// Continue from `cursor`
    pub fn set_cursor(&mut self, cursor: String) {
        self.cursor = Some(cursor);
    }

    /// Count a fetched page of `records` records
    pub fn add_page(&mut self, records: usize) {
        self.pages += 1;
        self.records += records as u64;
    }
}

/// A way of walking a paginated listing
pub trait Paginator: Send + Sync {
    /// Add the position parameters for `state` to `request`
    fn prepare(&self, request: HttpRequest, state: &PaginationState) -> HttpRequest;

    /// Move `state` past a page that held `records_count` records
    fn process_response(
        &self,
        body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}
