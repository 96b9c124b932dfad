//! Bundled demo dataset and database seeding.
//!
//! # Responsibility
//! - Parse the bundled JSON dataset into model records.
//! - Populate an empty store once, or wipe and repopulate on demand.
//!
//! # Invariants
//! - Seeding runs in one transaction; a failure leaves the store unchanged.
//! - `seed_if_empty` never touches a store that already holds tascas.
//! - Seeded rows are not marked `pending_sync`.

use crate::geo::GeoPoint;
use crate::model::review::Review;
use crate::model::tasca::{PriceLevel, Tasca};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::tasca_repo::{RepoError, SqliteTascaRepository, TascaRepository};
use crate::schedule::WeeklySchedule;
use log::info;
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const BUNDLED_DATASET: &str = include_str!("../fixtures/seed_tascas.json");

/// Seeding error.
#[derive(Debug)]
pub enum SeedError {
    Json(serde_json::Error),
    Repo(RepoError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid seed dataset: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<RepoError> for SeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SeedError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// One review of a seeded tasca.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedReview {
    pub user_nick: String,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    #[serde(default)]
    pub comment: String,
}

/// One seeded tasca with its reviews.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedTasca {
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_level: PriceLevel,
    #[serde(default)]
    pub has_menu_of_day: bool,
    #[serde(default)]
    pub accepts_cards: bool,
    #[serde(default)]
    pub veg_options: bool,
    #[serde(default)]
    pub gluten_free: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub menu_url: Option<String>,
    #[serde(default)]
    pub schedule: WeeklySchedule,
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

impl SeedTasca {
    /// Builds the tasca record with a fresh id.
    pub fn to_tasca(&self) -> Tasca {
        let mut tasca = Tasca::new(
            self.name.as_str(),
            self.address.as_str(),
            self.city.as_str(),
            GeoPoint::new(self.lat, self.lng),
            self.price_level,
        );
        tasca.has_menu_of_day = self.has_menu_of_day;
        tasca.accepts_cards = self.accepts_cards;
        tasca.veg_options = self.veg_options;
        tasca.gluten_free = self.gluten_free;
        tasca.tags_csv = self.tags.join(", ");
        tasca.phone = self.phone.clone();
        tasca.website = self.website.clone();
        tasca.menu_url = self.menu_url.clone();
        tasca.schedule = self.schedule.clone();
        tasca
    }
}

/// Demo dataset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedDataset {
    pub tascas: Vec<SeedTasca>,
}

impl SeedDataset {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Dataset compiled into the crate.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn review_count(&self) -> usize {
        self.tascas.iter().map(|tasca| tasca.reviews.len()).sum()
    }
}

/// Result of a seeding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { tascas: usize, reviews: usize },
    Skipped { existing: u64 },
}

/// Seeds the dataset when the store holds no tascas.
pub fn seed_if_empty(conn: &Connection, dataset: &SeedDataset) -> Result<SeedOutcome, SeedError> {
    let existing = SqliteTascaRepository::try_new(conn)?.count_tascas()?;
    if existing > 0 {
        info!("event=seed module=seed status=skipped existing={existing}");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let started_at = Instant::now();
    let tx = conn.unchecked_transaction()?;
    let (tascas, reviews) = insert_dataset(&tx, dataset)?;
    tx.commit()?;

    info!(
        "event=seed module=seed status=ok tascas={} reviews={} duration_ms={}",
        tascas,
        reviews,
        started_at.elapsed().as_millis()
    );
    Ok(SeedOutcome::Seeded { tascas, reviews })
}

/// Deletes all tascas and reviews, then seeds the dataset.
pub fn reset_database(
    conn: &mut Connection,
    dataset: &SeedDataset,
) -> Result<SeedOutcome, SeedError> {
    let started_at = Instant::now();
    let tx = conn.transaction()?;
    let removed_reviews = tx.execute("DELETE FROM reviews;", [])?;
    let removed_tascas = tx.execute("DELETE FROM tascas;", [])?;
    let (tascas, reviews) = insert_dataset(&tx, dataset)?;
    tx.commit()?;

    info!(
        "event=db_reset module=seed status=ok removed_tascas={} removed_reviews={} tascas={} reviews={} duration_ms={}",
        removed_tascas,
        removed_reviews,
        tascas,
        reviews,
        started_at.elapsed().as_millis()
    );
    Ok(SeedOutcome::Seeded { tascas, reviews })
}

fn insert_dataset(conn: &Connection, dataset: &SeedDataset) -> Result<(usize, usize), SeedError> {
    let tasca_repo = SqliteTascaRepository::try_new(conn)?;
    let review_repo = SqliteReviewRepository::try_new(conn)?;

    let mut review_count = 0;
    for seed in &dataset.tascas {
        let tasca_id = tasca_repo.create_tasca(&seed.to_tasca())?;
        for review in &seed.reviews {
            review_repo.create_review(&Review::new(
                tasca_id,
                review.user_nick.as_str(),
                review.comida,
                review.ambiente,
                review.preco_justo,
                review.comment.as_str(),
            ))?;
            review_count += 1;
        }
    }
    Ok((dataset.tascas.len(), review_count))
}
