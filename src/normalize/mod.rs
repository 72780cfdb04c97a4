//! Record normalization module
//!
//! Rewrites every record before it is written so the target warehouse can
//! load it: marked keys (`archived?`) are renamed, and configured dynamic-key
//! maps become ordered `{key, value}` arrays.
//!
//! # Overview
//!
//! - [`walk`] is a depth-first traversal applying a [`Visitor`] at every
//!   object entry
//! - [`KeySanitizer`] and [`MapFlattener`] are the two visitors
//! - [`Normalizer`] runs both passes and owns the archival filter

mod normalizer;
mod transforms;
mod visitor;

pub use normalizer::Normalizer;
pub use transforms::{KeySanitizer, MapFlattener};
pub use visitor::{walk, Visitor};

#[cfg(test)]
mod tests;
