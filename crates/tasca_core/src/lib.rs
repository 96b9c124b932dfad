//! Core domain logic for the tasca directory.
//! Listing, ranking, schedules and submissions live here; the FFI and CLI
//! crates only translate arguments and results.

pub mod db;
pub mod format;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod score;
pub mod search;
pub mod seed;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use geo::{distance_km, GeoPoint, EARTH_RADIUS_KM};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::review::{Review, ReviewId, ReviewValidationError};
pub use model::tasca::{PriceLevel, Tasca, TascaId, TascaValidationError};
pub use repo::review_repo::{ReviewRepository, SqliteReviewRepository};
pub use repo::tasca_repo::{RepoError, RepoResult, SqliteTascaRepository, TascaRepository};
pub use schedule::{
    format_schedule_range, is_open, todays_schedule, DayKey, ScheduleError, TimeOfDay, TimeRange,
    WeeklySchedule,
};
pub use score::{compute_score, Rating, RatingDimensions, ScoreInfo};
pub use search::suggest::{search_suggestions, Suggestion, SuggestionQuery};
pub use seed::{reset_database, seed_if_empty, SeedDataset, SeedError, SeedOutcome};
pub use service::listing_service::{
    ListingFilters, ListingOptions, ListingService, RankedTasca, TascaDetail,
};
pub use service::submission_service::{
    ReviewDraft, SubmissionError, SubmissionService, TascaDraft,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
