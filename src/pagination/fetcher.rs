//! Lazy page fetcher
//!
//! One fetcher covers one endpoint for one run. It is finite and cannot be
//! restarted: once a short or empty page is seen, or a request fails, every
//! further call yields nothing.

use super::types::{PaginationState, Paginator};
use crate::decode::{decode_body, PageEnvelope};
use crate::error::{Error, Result};
use crate::http::{send_with_retry, HttpRequest, HttpTransport, RetryPolicy};
use crate::types::JsonValue;
use futures::stream::{self, Stream};
use std::sync::Arc;
use tracing::debug;

/// Issues successive page requests against one endpoint
pub struct PageFetcher {
    endpoint: String,
    transport: Arc<dyn HttpTransport>,
    template: HttpRequest,
    paginator: Box<dyn Paginator>,
    policy: RetryPolicy,
    records_fields: Vec<String>,
    max_pages: Option<u32>,
    state: PaginationState,
}

impl PageFetcher {
    /// Create a fetcher
    ///
    /// `template` carries the URL, headers, static query parameters and
    /// timeout; the paginator adds the position of each page to a copy of it.
    pub fn new(
        endpoint: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        template: HttpRequest,
        paginator: Box<dyn Paginator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            template,
            paginator,
            policy,
            records_fields: ["data", "items", "results"].map(String::from).to_vec(),
            max_pages: None,
            state: PaginationState::new(),
        }
    }

    /// Set the fields that may wrap a page's records
    #[must_use]
    pub fn with_records_fields(mut self, fields: Vec<String>) -> Self {
        self.records_fields = fields;
        self
    }

    /// Fail once more than `max_pages` pages would be needed
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Pagination state so far
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Whether the sequence has ended
    pub fn is_done(&self) -> bool {
        self.state.done
    }

    /// Fetch the next page
    ///
    /// Returns `Ok(None)` once the sequence has ended. An empty page ends the
    /// sequence without being yielded.
    pub async fn next_page(&mut self) -> Result<Option<Vec<JsonValue>>> {
        if self.state.done {
            return Ok(None);
        }
        if let Some(max_pages) = self.max_pages {
            if self.state.pages >= max_pages {
                self.state.mark_done();
                return Err(Error::PageLimitExceeded {
                    endpoint: self.endpoint.clone(),
                    max_pages,
                });
            }
        }

        let request = self.paginator.prepare(self.template.clone(), &self.state);
        let transport = self.transport.as_ref();
        let body = match send_with_retry(transport, &request, &self.policy)
            .await
            .and_then(|response| decode_body(&response.body))
        {
            Ok(body) => body,
            Err(e) => {
                self.state.mark_done();
                return Err(e);
            }
        };
        let count = PageEnvelope::count(&body, &self.records_fields);
        let next = self.paginator.process_response(&body, count, &mut self.state);
        let records = PageEnvelope::from_value(body, &self.records_fields).into_records();

        debug!(
            endpoint = %self.endpoint,
            page = self.state.pages,
            records = records.len(),
            done = next.is_done(),
            "Fetched page"
        );

        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records))
    }

    /// Turn the fetcher into a stream of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<JsonValue>>> + Send {
        stream::try_unfold(self, |mut fetcher| async move {
            Ok(fetcher.next_page().await?.map(|page| (page, fetcher)))
        })
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("endpoint", &self.endpoint)
            .field("url", &self.template.url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
