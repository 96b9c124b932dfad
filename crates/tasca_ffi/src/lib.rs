//! Flutter bridge for the tasca directory core.

pub mod api;
