//! User-submission use-cases: new tascas and new reviews.
//!
//! # Responsibility
//! - Normalize raw form input into model records.
//! - Mark local submissions as pending synchronization.
//! - Return the stored record as read back from the store.
//!
//! # Invariants
//! - Every submission gets a fresh UUID and `pending_sync = true`.
//! - Blank optional text fields are stored as `None`.
//! - Malformed schedules are rejected before anything is written.

use crate::geo::GeoPoint;
use crate::model::review::{Review, ReviewValidationError};
use crate::model::tasca::{PriceLevel, Tasca, TascaId, TascaValidationError};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::tasca_repo::{RepoError, SqliteTascaRepository, TascaRepository};
use crate::schedule::{ScheduleError, WeeklySchedule};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for submission use-cases.
#[derive(Debug)]
pub enum SubmissionError {
    /// Price tier outside 1..=3.
    InvalidPriceLevel(u8),
    /// Schedule text could not be parsed.
    Schedule(ScheduleError),
    /// Tasca fields failed validation.
    InvalidTasca(TascaValidationError),
    /// Review fields failed validation.
    InvalidReview(ReviewValidationError),
    /// Reviewed tasca does not exist.
    TascaNotFound(TascaId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for SubmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPriceLevel(level) => {
                write!(f, "price level must be 1..=3, got {level}")
            }
            Self::Schedule(err) => write!(f, "{err}"),
            Self::InvalidTasca(err) => write!(f, "{err}"),
            Self::InvalidReview(err) => write!(f, "{err}"),
            Self::TascaNotFound(id) => write!(f, "tasca not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent submission state: {details}")
            }
        }
    }
}

impl Error for SubmissionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schedule(err) => Some(err),
            Self::InvalidTasca(err) => Some(err),
            Self::InvalidReview(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScheduleError> for SubmissionError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<RepoError> for SubmissionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidTasca(err) => Self::InvalidTasca(err),
            RepoError::InvalidReview(err) => Self::InvalidReview(err),
            RepoError::NotFound(id) => Self::TascaNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Raw input of the add-tasca form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TascaDraft {
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_level: u8,
    pub has_menu_of_day: bool,
    pub accepts_cards: bool,
    pub veg_options: bool,
    pub gluten_free: bool,
    pub tags_csv: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub menu_url: Option<String>,
    /// Line format, e.g. `mon:12:00-15:00,19:00-22:00`. Blank means closed.
    pub schedule_text: String,
}

/// Raw input of the add-review form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub tasca_id: TascaId,
    pub user_nick: String,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    pub comment: String,
}

/// Submission facade over tasca/review repositories.
pub struct SubmissionService<T: TascaRepository, R: ReviewRepository> {
    tascas: T,
    reviews: R,
}

impl<'conn> SubmissionService<SqliteTascaRepository<'conn>, SqliteReviewRepository<'conn>> {
    /// Builds a service over SQLite repositories sharing one connection.
    pub fn try_from_connection(conn: &'conn Connection) -> Result<Self, SubmissionError> {
        Ok(Self::new(
            SqliteTascaRepository::try_new(conn)?,
            SqliteReviewRepository::try_new(conn)?,
        ))
    }
}

impl<T: TascaRepository, R: ReviewRepository> SubmissionService<T, R> {
    pub fn new(tascas: T, reviews: R) -> Self {
        Self { tascas, reviews }
    }

    /// Stores a new tasca from form input.
    pub fn add_tasca(&self, draft: TascaDraft) -> Result<Tasca, SubmissionError> {
        let tasca = build_tasca(draft)?;
        let id = match self.tascas.create_tasca(&tasca) {
            Ok(id) => id,
            Err(err) => {
                warn!("event=tasca_submit module=submission status=error error={err}");
                return Err(err.into());
            }
        };
        info!("event=tasca_submit module=submission status=ok pending_sync=true");

        self.tascas
            .get_tasca(id)?
            .ok_or(SubmissionError::InconsistentState(
                "created tasca not found in read-back",
            ))
    }

    /// Stores a new review for an existing tasca.
    pub fn add_review(&self, draft: ReviewDraft) -> Result<Review, SubmissionError> {
        let mut review = Review::new(
            draft.tasca_id,
            draft.user_nick.trim(),
            draft.comida,
            draft.ambiente,
            draft.preco_justo,
            draft.comment.trim(),
        );
        review.pending_sync = true;

        let id = match self.reviews.create_review(&review) {
            Ok(id) => id,
            Err(err) => {
                warn!("event=review_submit module=submission status=error error={err}");
                return Err(err.into());
            }
        };
        info!("event=review_submit module=submission status=ok pending_sync=true");

        self.reviews
            .list_reviews_for_tasca(draft.tasca_id)?
            .into_iter()
            .find(|stored| stored.id == id)
            .ok_or(SubmissionError::InconsistentState(
                "created review not found in read-back",
            ))
    }
}

/// Normalizes form input into a pending tasca record.
pub fn build_tasca(draft: TascaDraft) -> Result<Tasca, SubmissionError> {
    let price_level = PriceLevel::from_level(draft.price_level)
        .ok_or(SubmissionError::InvalidPriceLevel(draft.price_level))?;
    let schedule = WeeklySchedule::parse_text(&draft.schedule_text)?;

    let mut tasca = Tasca::new(
        draft.name.trim(),
        draft.address.trim(),
        draft.city.trim(),
        GeoPoint::new(draft.lat, draft.lng),
        price_level,
    );
    tasca.has_menu_of_day = draft.has_menu_of_day;
    tasca.accepts_cards = draft.accepts_cards;
    tasca.veg_options = draft.veg_options;
    tasca.gluten_free = draft.gluten_free;
    tasca.tags_csv = draft.tags_csv.trim().to_string();
    tasca.phone = non_blank(draft.phone);
    tasca.website = non_blank(draft.website);
    tasca.menu_url = non_blank(draft.menu_url);
    tasca.schedule = schedule;
    tasca.pending_sync = true;

    tasca.validate().map_err(SubmissionError::InvalidTasca)?;
    Ok(tasca)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
