//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Flatten core view-models into display-ready envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through envelope messages, never by throwing.
//! - The database is seeded with the bundled dataset on first use when empty.

use chrono::{Local, NaiveDateTime};
use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use tasca_core::db::open_db;
use tasca_core::format::{format_distance, format_price_level, format_score};
use tasca_core::{
    core_version as core_version_inner, format_schedule_range, init_logging as init_logging_inner,
    is_open, ping as ping_inner, search_suggestions as search_suggestions_inner, seed_if_empty,
    todays_schedule, DayKey, GeoPoint, ListingFilters, ListingOptions, ListingService,
    RankedTasca, Review, ReviewDraft, SeedDataset, SubmissionService, SuggestionQuery, TascaDraft,
    TascaId,
};

const SUGGESTION_DEFAULT_LIMIT: u32 = 10;
const SUGGESTION_LIMIT_MAX: u32 = 20;
const TASCA_DB_FILE_NAME: &str = "tasca_directory.sqlite3";
const DB_PATH_ENV: &str = "TASCA_DB_PATH";
static TASCA_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
// Serializes opens so migrations and first-use seeding never race.
static SEED_CHECKED: Mutex<bool> = Mutex::new(false);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by every DB-backed call.
///
/// Must run before the first DB-backed call; afterwards only the already
/// active path is accepted. Returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = TASCA_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Listing request: free-text query, filter toggles and optional location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TascaListRequest {
    pub query: Option<String>,
    pub barato: bool,
    pub menu: bool,
    pub petiscos: bool,
    pub comida_caseira: bool,
    pub aberto_agora: bool,
    /// Both `lat` and `lng` are required for distance sorting.
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Card shown in the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TascaListItem {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_level: u8,
    /// `€`, `€€` or `€€€`.
    pub price_label: String,
    pub tags: Vec<String>,
    pub has_menu_of_day: bool,
    pub accepts_cards: bool,
    pub veg_options: bool,
    pub gluten_free: bool,
    pub score: f64,
    pub score_label: String,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    pub reviews_count: u32,
    pub distance_km: Option<f64>,
    pub distance_label: Option<String>,
    pub open_now: bool,
    /// Today's ranges, e.g. `12:00–15:00, 19:00–23:00`; empty when closed.
    pub today_hours: String,
    pub pending_sync: bool,
}

/// Listing response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct TascaListResponse {
    pub ok: bool,
    pub items: Vec<TascaListItem>,
    pub message: String,
}

/// Review row shown on the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub id: String,
    pub user_nick: String,
    pub comida: f64,
    pub ambiente: f64,
    pub preco_justo: f64,
    pub comment: String,
    pub created_at_epoch_ms: Option<i64>,
    pub pending_sync: bool,
}

/// Weekly opening hours line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDayItem {
    /// `sun`..`sat`.
    pub day: String,
    /// Formatted ranges; empty when closed.
    pub hours: String,
}

/// Detail response envelope. `item` is `None` for unknown ids.
#[derive(Debug, Clone, PartialEq)]
pub struct TascaDetailResponse {
    pub ok: bool,
    pub item: Option<TascaListItem>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub menu_url: Option<String>,
    pub schedule: Vec<ScheduleDayItem>,
    pub reviews: Vec<ReviewItem>,
    pub message: String,
}

impl TascaDetailResponse {
    fn empty(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            item: None,
            phone: None,
            website: None,
            menu_url: None,
            schedule: Vec::new(),
            reviews: Vec::new(),
            message: message.into(),
        }
    }
}

/// Add-tasca form payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TascaAddRequest {
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
    pub schedule_text: String,
}

/// Generic action response envelope for submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Created record ID on success.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Single suggestion hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    pub id: String,
    pub name: String,
}

/// Suggestion response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResponse {
    pub items: Vec<SuggestionItem>,
    pub message: String,
    /// Effective applied limit.
    pub applied_limit: u32,
}

/// Lists tascas with query, filters and optional proximity sort.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - `aberto_agora` is evaluated against the device's local time.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn tasca_list(request: TascaListRequest) -> TascaListResponse {
    let now = local_now();
    let options = list_options(request, now);

    let result = with_connection(|conn| {
        let service = ListingService::try_from_connection(conn).map_err(|err| err.to_string())?;
        service.list(&options).map_err(|err| err.to_string())
    });

    match result {
        Ok(items) => {
            let items = items
                .iter()
                .map(|item| to_list_item(item, now))
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No tascas found.".to_string()
            } else {
                format!("Found {} tasca(s).", items.len())
            };
            TascaListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => TascaListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("tasca_list failed: {err}"),
        },
    }
}

/// Loads one tasca with reviews (newest first) and its weekly hours.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unknown ids return `ok=true` with `item=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn tasca_get(id: String, lat: Option<f64>, lng: Option<f64>) -> TascaDetailResponse {
    let tasca_id = match parse_id(&id) {
        Ok(tasca_id) => tasca_id,
        Err(err) => return TascaDetailResponse::empty(false, format!("tasca_get failed: {err}")),
    };
    let location = request_location(lat, lng);

    let result = with_connection(|conn| {
        let service = ListingService::try_from_connection(conn).map_err(|err| err.to_string())?;
        service
            .get_by_id(tasca_id, location)
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(Some(detail)) => {
            let tasca = &detail.ranked.tasca;
            let schedule = DayKey::ALL
                .into_iter()
                .map(|day| ScheduleDayItem {
                    day: day.as_str().to_string(),
                    hours: format_schedule_range(tasca.schedule.ranges_for(day)),
                })
                .collect();
            TascaDetailResponse {
                ok: true,
                item: Some(to_list_item(&detail.ranked, local_now())),
                phone: tasca.phone.clone(),
                website: tasca.website.clone(),
                menu_url: tasca.menu_url.clone(),
                schedule,
                reviews: detail.reviews.iter().map(to_review_item).collect(),
                message: "Tasca found.".to_string(),
            }
        }
        Ok(None) => TascaDetailResponse::empty(true, "Tasca not found."),
        Err(err) => TascaDetailResponse::empty(false, format!("tasca_get failed: {err}")),
    }
}

/// Submits a new tasca from the add-tasca form.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns created tasca ID on success, validation message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn tasca_add(request: TascaAddRequest) -> ActionResponse {
    let draft = TascaDraft {
        name: request.name,
        address: request.address,
        city: request.city,
        lat: request.lat,
        lng: request.lng,
        price_level: request.price_level,
        has_menu_of_day: request.has_menu_of_day,
        accepts_cards: request.accepts_cards,
        veg_options: request.veg_options,
        gluten_free: request.gluten_free,
        tags_csv: request.tags_csv,
        phone: request.phone,
        website: request.website,
        menu_url: request.menu_url,
        schedule_text: request.schedule_text,
    };

    let result = with_connection(|conn| {
        let service =
            SubmissionService::try_from_connection(conn).map_err(|err| err.to_string())?;
        service.add_tasca(draft).map_err(|err| err.to_string())
    });

    match result {
        Ok(tasca) => ActionResponse::success("Tasca added.", tasca.id.to_string()),
        Err(err) => ActionResponse::failure(format!("tasca_add failed: {err}")),
    }
}

/// Submits a review for an existing tasca.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns created review ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn review_add(
    tasca_id: String,
    user_nick: String,
    comida: f64,
    ambiente: f64,
    preco_justo: f64,
    comment: String,
) -> ActionResponse {
    let tasca_id = match parse_id(&tasca_id) {
        Ok(id) => id,
        Err(err) => return ActionResponse::failure(format!("review_add failed: {err}")),
    };
    let draft = ReviewDraft {
        tasca_id,
        user_nick,
        comida,
        ambiente,
        preco_justo,
        comment,
    };

    let result = with_connection(|conn| {
        let service =
            SubmissionService::try_from_connection(conn).map_err(|err| err.to_string())?;
        service.add_review(draft).map_err(|err| err.to_string())
    });

    match result {
        Ok(review) => ActionResponse::success("Review added.", review.id.to_string()),
        Err(err) => ActionResponse::failure(format!("review_add failed: {err}")),
    }
}

/// Name suggestions for the search box.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns deterministic envelope with applied limit.
#[flutter_rust_bridge::frb(sync)]
pub fn search_suggestions(text: String, limit: Option<u32>) -> SuggestionResponse {
    let applied_limit = normalize_suggestion_limit(limit);
    let query = SuggestionQuery {
        text: text.trim().to_string(),
        limit: applied_limit,
    };

    let result = with_connection(|conn| {
        search_suggestions_inner(conn, &query).map_err(|err| err.to_string())
    });

    match result {
        Ok(hits) => {
            let items = hits
                .into_iter()
                .map(|hit| SuggestionItem {
                    id: hit.id.to_string(),
                    name: hit.name,
                })
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No suggestions.".to_string()
            } else {
                format!("Found {} suggestion(s).", items.len())
            };
            SuggestionResponse {
                items,
                message,
                applied_limit,
            }
        }
        Err(err) => SuggestionResponse {
            items: Vec::new(),
            message: format!("search_suggestions failed: {err}"),
            applied_limit,
        },
    }
}

/// Filter and card flags share one reference time.
fn list_options(request: TascaListRequest, now: NaiveDateTime) -> ListingOptions {
    ListingOptions {
        query: request.query.filter(|query| !query.trim().is_empty()),
        filters: ListingFilters {
            barato: request.barato,
            menu: request.menu,
            petiscos: request.petiscos,
            comida_caseira: request.comida_caseira,
            aberto_agora: request.aberto_agora,
        },
        location: request_location(request.lat, request.lng),
        reference_time: Some(now),
    }
}

fn normalize_suggestion_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => SUGGESTION_DEFAULT_LIMIT,
        Some(value) => value.min(SUGGESTION_LIMIT_MAX),
    }
}

fn request_location(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    }
}

fn parse_id(raw: &str) -> Result<TascaId, String> {
    TascaId::parse_str(raw.trim()).map_err(|_| format!("invalid tasca id `{}`", raw.trim()))
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn resolve_db_path() -> PathBuf {
    TASCA_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TASCA_DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T>(
    f: impl FnOnce(&Connection) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_seeded_connection()?;
    f(&conn)
}

fn open_seeded_connection() -> Result<Connection, String> {
    let db_path = resolve_db_path();
    let mut seeded = SEED_CHECKED.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(&db_path).map_err(|err| format!("DB open failed: {err}"))?;
    if *seeded {
        return Ok(conn);
    }

    let dataset = SeedDataset::bundled().map_err(|err| format!("seed dataset invalid: {err}"))?;
    if let Err(err) = seed_if_empty(&conn, &dataset) {
        warn!("event=seed module=ffi status=error error={err}");
        return Err(format!("seeding failed: {err}"));
    }
    *seeded = true;
    Ok(conn)
}

fn to_list_item(ranked: &RankedTasca, now: NaiveDateTime) -> TascaListItem {
    let tasca = &ranked.tasca;
    TascaListItem {
        id: tasca.id.to_string(),
        name: tasca.name.clone(),
        address: tasca.address.clone(),
        city: tasca.city.clone(),
        lat: tasca.lat,
        lng: tasca.lng,
        price_level: tasca.price_level.level(),
        price_label: format_price_level(tasca.price_level),
        tags: tasca.tags().into_iter().map(str::to_string).collect(),
        has_menu_of_day: tasca.has_menu_of_day,
        accepts_cards: tasca.accepts_cards,
        veg_options: tasca.veg_options,
        gluten_free: tasca.gluten_free,
        score: ranked.score.score,
        score_label: format_score(ranked.score.score),
        comida: ranked.score.comida,
        ambiente: ranked.score.ambiente,
        preco_justo: ranked.score.preco_justo,
        reviews_count: u32::try_from(ranked.score.reviews_count).unwrap_or(u32::MAX),
        distance_km: ranked.distance_km,
        distance_label: ranked.distance_km.map(format_distance),
        open_now: is_open(&tasca.schedule, now),
        today_hours: format_schedule_range(todays_schedule(&tasca.schedule, now)),
        pending_sync: tasca.pending_sync,
    }
}

fn to_review_item(review: &Review) -> ReviewItem {
    ReviewItem {
        id: review.id.to_string(),
        user_nick: review.user_nick.clone(),
        comida: review.comida,
        ambiente: review.ambiente,
        preco_justo: review.preco_justo,
        comment: review.comment.clone(),
        created_at_epoch_ms: review.created_at,
        pending_sync: review.pending_sync,
    }
}
