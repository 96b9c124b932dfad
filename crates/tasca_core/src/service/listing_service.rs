//! Listing pipeline: search, score, measure, filter and rank tascas.
//!
//! # Responsibility
//! - Combine store reads with score aggregation, distance and schedule
//!   evaluation into ranked view-models.
//! - Provide the single-tasca detail projection with its reviews.
//!
//! # Invariants
//! - Every call recomputes from the store; nothing is cached.
//! - Filters are AND-combined pure predicates.
//! - With a location the order is ascending distance (unknown last);
//!   without one it is descending score. Both sorts are stable.
//! - Store failures are returned unchanged.

use crate::geo::GeoPoint;
use crate::model::review::Review;
use crate::model::tasca::{PriceLevel, Tasca, TascaId};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::tasca_repo::{RepoResult, SqliteTascaRepository, TascaRepository};
use crate::schedule::is_open;
use crate::score::{compute_score, ScoreInfo};
use chrono::{Local, NaiveDateTime};
use log::{debug, error, info};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;

/// Optional listing filters, all off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingFilters {
    /// Only the cheapest price tier.
    pub barato: bool,
    /// Only places with a menu of the day.
    pub menu: bool,
    /// Tags mention "petisco".
    pub petiscos: bool,
    /// Tags mention "caseir" or "tradicional".
    pub comida_caseira: bool,
    /// Open at the reference time.
    pub aberto_agora: bool,
}

impl ListingFilters {
    /// Whether any filter is enabled.
    pub fn any(&self) -> bool {
        self.barato || self.menu || self.petiscos || self.comida_caseira || self.aberto_agora
    }

    /// Evaluates every enabled filter against one tasca.
    pub fn matches(&self, tasca: &Tasca, at: NaiveDateTime) -> bool {
        if self.barato && tasca.price_level != PriceLevel::Cheap {
            return false;
        }
        if self.menu && !tasca.has_menu_of_day {
            return false;
        }
        if self.petiscos && !tasca.tags_contain("petisco") {
            return false;
        }
        if self.comida_caseira && !tasca.tags_contain("caseir") && !tasca.tags_contain("tradicional")
        {
            return false;
        }
        if self.aberto_agora && !is_open(&tasca.schedule, at) {
            return false;
        }
        true
    }
}

/// Options for one listing call.
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    /// Substring matched against name, city or address.
    pub query: Option<String>,
    pub filters: ListingFilters,
    /// Origin for distance measurement and proximity sort.
    pub location: Option<GeoPoint>,
    /// Instant used by `aberto_agora`; defaults to the local wall clock.
    pub reference_time: Option<NaiveDateTime>,
}

/// Ranked view-model: stored fields plus derived score and distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTasca {
    #[serde(flatten)]
    pub tasca: Tasca,
    #[serde(flatten)]
    pub score: ScoreInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Detail view-model with the tasca's reviews, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TascaDetail {
    #[serde(flatten)]
    pub ranked: RankedTasca,
    pub reviews: Vec<Review>,
}

/// Listing facade over tasca/review repositories.
pub struct ListingService<T: TascaRepository, R: ReviewRepository> {
    tascas: T,
    reviews: R,
}

impl<'conn> ListingService<SqliteTascaRepository<'conn>, SqliteReviewRepository<'conn>> {
    /// Builds a service over SQLite repositories sharing one connection.
    pub fn try_from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteTascaRepository::try_new(conn)?,
            SqliteReviewRepository::try_new(conn)?,
        ))
    }
}

impl<T: TascaRepository, R: ReviewRepository> ListingService<T, R> {
    pub fn new(tascas: T, reviews: R) -> Self {
        Self { tascas, reviews }
    }

    /// Lists tascas matching the options, ranked.
    pub fn list(&self, options: &ListingOptions) -> RepoResult<Vec<RankedTasca>> {
        let started_at = Instant::now();
        let result = self.list_inner(options);
        match &result {
            Ok(items) => info!(
                "event=tasca_list module=listing status=ok has_query={} has_filters={} by_distance={} count={} duration_ms={}",
                options.query.as_deref().is_some_and(|q| !q.trim().is_empty()),
                options.filters.any(),
                options.location.is_some(),
                items.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=tasca_list module=listing status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Gets one tasca with score, optional distance and its reviews.
    ///
    /// Returns `Ok(None)` for unknown ids.
    pub fn get_by_id(
        &self,
        id: TascaId,
        location: Option<GeoPoint>,
    ) -> RepoResult<Option<TascaDetail>> {
        let Some(tasca) = self.tascas.get_tasca(id)? else {
            debug!("event=tasca_get module=listing status=not_found");
            return Ok(None);
        };
        let reviews = self.reviews.list_reviews_for_tasca(id)?;
        let ranked = rank(tasca, &reviews, location);
        Ok(Some(TascaDetail { ranked, reviews }))
    }

    fn list_inner(&self, options: &ListingOptions) -> RepoResult<Vec<RankedTasca>> {
        let candidates = self.tascas.list_tascas(options.query.as_deref())?;
        debug!(
            "event=tasca_list module=listing status=candidates count={}",
            candidates.len()
        );

        let mut ranked = Vec::with_capacity(candidates.len());
        for tasca in candidates {
            let reviews = self.reviews.list_reviews_for_tasca(tasca.id)?;
            ranked.push(rank(tasca, &reviews, options.location));
        }

        let at = options
            .reference_time
            .unwrap_or_else(|| Local::now().naive_local());
        let mut filtered = apply_filters(ranked, &options.filters, at);
        sort_ranked(&mut filtered, options.location.is_some());
        Ok(filtered)
    }
}

/// Builds the view-model for one tasca from its reviews.
pub fn rank(tasca: Tasca, reviews: &[Review], location: Option<GeoPoint>) -> RankedTasca {
    let score = compute_score(reviews);
    let distance_km = location.map(|origin| origin.distance_km_to(&tasca.location()));
    RankedTasca {
        tasca,
        score,
        distance_km,
    }
}

/// Keeps the items accepted by every enabled filter, preserving order.
pub fn apply_filters(
    items: Vec<RankedTasca>,
    filters: &ListingFilters,
    at: NaiveDateTime,
) -> Vec<RankedTasca> {
    if !filters.any() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| filters.matches(&item.tasca, at))
        .collect()
}

/// Sorts by ascending distance (unknown last) or descending score.
pub fn sort_ranked(items: &mut [RankedTasca], by_distance: bool) {
    if by_distance {
        items.sort_by(|a, b| {
            let left = a.distance_km.unwrap_or(f64::INFINITY);
            let right = b.distance_km.unwrap_or(f64::INFINITY);
            left.total_cmp(&right)
        });
    } else {
        items.sort_by(|a, b| b.score.score.total_cmp(&a.score.score));
    }
}
