//! Type-ahead search entry points.
//!
//! # Responsibility
//! - Expose lightweight name lookups for the search box.
//! - Keep result shaping inside core.

pub mod suggest;
