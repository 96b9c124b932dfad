//! Domain model for listed places and their reviews.
//!
//! # Responsibility
//! - Define canonical records persisted by the store.
//! - Own write-side validation rules shared by every submission path.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Rows are only deleted by `seed::reset_database`.

pub mod review;
pub mod tasca;
