//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern. Both stop as soon as
//! a page comes back with fewer records than requested.

use super::types::{NextPage, PaginationState, Paginator};
use crate::config::PaginationConfig;
use crate::decode::lookup_token;
use crate::http::HttpRequest;
use crate::types::JsonValue;
use serde_json::json;

/// Build the paginator an endpoint is configured with
pub fn paginator_for(config: &PaginationConfig, page_size: u32) -> Box<dyn Paginator> {
    match config {
        PaginationConfig::Offset {
            offset_field,
            limit_field,
        } => Box::new(OffsetPaginator::new(offset_field, limit_field, page_size)),
        PaginationConfig::Cursor {
            limit_param,
            cursor_param,
            cursor_path,
        } => Box::new(CursorPaginator::new(
            limit_param,
            cursor_param,
            cursor_path,
            page_size,
        )),
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination carried in a JSON request body
///
/// Each request posts `{"offset": N, "limit": page_size}`; the offset advances
/// by the page size after every full page.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Body field name for offset
    pub offset_field: String,
    /// Body field name for limit
    pub limit_field: String,
    /// Number of records per page
    pub page_size: u32,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(
        offset_field: impl Into<String>,
        limit_field: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            offset_field: offset_field.into(),
            limit_field: limit_field.into(),
            page_size,
        }
    }
}

impl Paginator for OffsetPaginator {
    fn prepare(&self, request: HttpRequest, state: &PaginationState) -> HttpRequest {
        let mut body = serde_json::Map::new();
        body.insert(self.offset_field.clone(), json!(state.offset));
        body.insert(self.limit_field.clone(), json!(self.page_size));
        request.json(JsonValue::Object(body))
    }

    fn process_response(
        &self,
        _body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_page(records_count);

        if records_count < self.page_size as usize {
            state.mark_done();
            return NextPage::Done;
        }

        state.add_offset(u64::from(self.page_size));
        NextPage::Continue
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination (e.g., HubSpot `paging.next.after`)
///
/// Uses a cursor value from the response to fetch the next page.
/// Common patterns:
/// - `?limit=100&after=abc123`
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter name for the page size
    pub limit_param: String,
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// Path to the next cursor in the response
    pub cursor_path: String,
    /// Number of records per page
    pub page_size: u32,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(
        limit_param: impl Into<String>,
        cursor_param: impl Into<String>,
        cursor_path: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            limit_param: limit_param.into(),
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
            page_size,
        }
    }
}

impl Paginator for CursorPaginator {
    fn prepare(&self, request: HttpRequest, state: &PaginationState) -> HttpRequest {
        let request = request.query(&self.limit_param, self.page_size.to_string());
        match &state.cursor {
            Some(cursor) => request.query(&self.cursor_param, cursor),
            None => request,
        }
    }

    fn process_response(
        &self,
        body: &JsonValue,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_page(records_count);

        if records_count < self.page_size as usize {
            state.mark_done();
            return NextPage::Done;
        }

        // A repeated token would request the same page forever
        match lookup_token(body, &self.cursor_path) {
            Some(cursor) if state.cursor.as_ref() != Some(&cursor) => {
                state.set_cursor(cursor);
                NextPage::Continue
            }
            _ => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}
