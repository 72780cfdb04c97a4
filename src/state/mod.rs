//! State management module
//!
//! Handles the per-endpoint watermark, the only state kept between runs.
//!
//! # Overview
//!
//! The state module provides:
//! - `WatermarkStore` - read with a first-run default, replace on success
//! - `BlobWatermarkStore` - one `state/<source>/<stateKey>.json` object per
//!   endpoint holding `{"updated_after": "<ISO-8601>"}`
//!
//! A watermark is only written after an endpoint's pass published its
//! partition. A crash mid-pass leaves the previous value in place, so the
//! next run re-reads the overlap instead of skipping data.

mod store;
mod types;

pub use store::{BlobWatermarkStore, WatermarkStore};
pub use types::Watermark;
