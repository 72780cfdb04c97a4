//! Response decoder module
//!
//! Turns one page response body into the records it carries.
//!
//! # Overview
//!
//! Upstream APIs answer a page request with either a top-level JSON array or
//! an object wrapping the records under a known field (`data`, `items`,
//! `results`). The shape is resolved once per page into a [`PageEnvelope`];
//! any other shape is an empty page.

mod envelope;
mod types;

pub use envelope::{decode_body, lookup_path, lookup_token};
pub use types::PageEnvelope;
