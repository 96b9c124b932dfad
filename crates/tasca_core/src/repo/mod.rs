//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contracts consumed by listing and submission services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce model validation before persistence.
//! - Repositories only accept connections opened through `db::open_db*`.

pub mod review_repo;
pub mod tasca_repo;
