//! Tasca repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide append/read APIs over canonical `tascas` storage.
//! - Own the case-insensitive substring pre-filter used by listings.
//! - Keep SQL and `schedule_json` encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Tasca::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state (bad UUID, price tier or
//!   schedule) instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::review::ReviewValidationError;
use crate::model::tasca::{PriceLevel, Tasca, TascaId, TascaValidationError};
use crate::schedule::WeeklySchedule;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASCA_SELECT_SQL: &str = "SELECT
    id,
    name,
    address,
    city,
    lat,
    lng,
    price_level,
    has_menu_of_day,
    accepts_cards,
    veg_options,
    gluten_free,
    tags_csv,
    phone,
    website,
    menu_url,
    schedule_json,
    created_at,
    updated_at,
    pending_sync
FROM tascas";

const TASCA_COLUMNS: &[&str] = &[
    "id",
    "name",
    "address",
    "city",
    "lat",
    "lng",
    "price_level",
    "has_menu_of_day",
    "accepts_cards",
    "veg_options",
    "gluten_free",
    "tags_csv",
    "phone",
    "website",
    "menu_url",
    "schedule_json",
    "created_at",
    "updated_at",
    "pending_sync",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for tasca/review persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    InvalidTasca(TascaValidationError),
    InvalidReview(ReviewValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTasca(err) => write!(f, "{err}"),
            Self::InvalidReview(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTasca(err) => Some(err),
            Self::InvalidReview(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TascaValidationError> for RepoError {
    fn from(value: TascaValidationError) -> Self {
        Self::InvalidTasca(value)
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
        Self::InvalidReview(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the tasca store.
pub trait TascaRepository {
    /// Inserts one tasca, stamping timestamps when absent.
    fn create_tasca(&self, tasca: &Tasca) -> RepoResult<TascaId>;
    /// Gets one tasca by id.
    fn get_tasca(&self, id: TascaId) -> RepoResult<Option<Tasca>>;
    /// Lists tascas; a non-blank `query` keeps rows whose name, city or
    /// address contains it (case-insensitive).
    fn list_tascas(&self, query: Option<&str>) -> RepoResult<Vec<Tasca>>;
    /// Counts stored tascas.
    fn count_tascas(&self) -> RepoResult<u64>;
}

/// SQLite-backed tasca repository.
pub struct SqliteTascaRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTascaRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "tascas", TASCA_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TascaRepository for SqliteTascaRepository<'_> {
    fn create_tasca(&self, tasca: &Tasca) -> RepoResult<TascaId> {
        tasca.validate()?;

        let schedule_json = tasca
            .schedule
            .to_json()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        let now = now_epoch_ms();
        let created_at = tasca.created_at.unwrap_or(now);
        let updated_at = tasca.updated_at.unwrap_or(created_at);

        self.conn.execute(
            "INSERT INTO tascas (
                id,
                name,
                address,
                city,
                lat,
                lng,
                price_level,
                has_menu_of_day,
                accepts_cards,
                veg_options,
                gluten_free,
                tags_csv,
                phone,
                website,
                menu_url,
                schedule_json,
                created_at,
                updated_at,
                pending_sync
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19);",
            params![
                tasca.id.to_string(),
                tasca.name.as_str(),
                tasca.address.as_str(),
                tasca.city.as_str(),
                tasca.lat,
                tasca.lng,
                i64::from(tasca.price_level.level()),
                bool_to_int(tasca.has_menu_of_day),
                bool_to_int(tasca.accepts_cards),
                bool_to_int(tasca.veg_options),
                bool_to_int(tasca.gluten_free),
                tasca.tags_csv.as_str(),
                tasca.phone.as_deref(),
                tasca.website.as_deref(),
                tasca.menu_url.as_deref(),
                schedule_json,
                created_at,
                updated_at,
                bool_to_int(tasca.pending_sync),
            ],
        )?;

        Ok(tasca.id)
    }

    fn get_tasca(&self, id: TascaId) -> RepoResult<Option<Tasca>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASCA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tasca_row(row)?));
        }

        Ok(None)
    }

    fn list_tascas(&self, query: Option<&str>) -> RepoResult<Vec<Tasca>> {
        let mut sql = String::from(TASCA_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(text) = query.map(str::trim).filter(|text| !text.is_empty()) {
            sql.push_str(
                " WHERE name LIKE ?1 ESCAPE '\\'
                   OR city LIKE ?1 ESCAPE '\\'
                   OR address LIKE ?1 ESCAPE '\\'",
            );
            bind_values.push(Value::Text(like_pattern(text)));
        }

        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tascas = Vec::new();
        while let Some(row) = rows.next()? {
            tascas.push(parse_tasca_row(row)?);
        }

        Ok(tascas)
    }

    fn count_tascas(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tascas;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative tasca count {count}")))
    }
}

/// Builds a `LIKE` substring pattern with `%`, `_` and `\` escaped.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn parse_tasca_row(row: &Row<'_>) -> RepoResult<Tasca> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "tascas.id")?;

    let level: i64 = row.get("price_level")?;
    let price_level = u8::try_from(level)
        .ok()
        .and_then(PriceLevel::from_level)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid price level `{level}` in tascas.price_level"
            ))
        })?;

    let schedule_json: String = row.get("schedule_json")?;
    let schedule = WeeklySchedule::from_json(&schedule_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid schedule for tasca {id}: {err}"))
    })?;

    Ok(Tasca {
        id,
        name: row.get("name")?,
        address: row.get("address")?,
        city: row.get("city")?,
        lat: row.get("lat")?,
        lng: row.get("lng")?,
        price_level,
        has_menu_of_day: int_to_bool(row.get("has_menu_of_day")?, "tascas.has_menu_of_day")?,
        accepts_cards: int_to_bool(row.get("accepts_cards")?, "tascas.accepts_cards")?,
        veg_options: int_to_bool(row.get("veg_options")?, "tascas.veg_options")?,
        gluten_free: int_to_bool(row.get("gluten_free")?, "tascas.gluten_free")?,
        tags_csv: row.get("tags_csv")?,
        phone: row.get("phone")?,
        website: row.get("website")?,
        menu_url: row.get("menu_url")?,
        schedule,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
        pending_sync: int_to_bool(row.get("pending_sync")?, "tascas.pending_sync")?,
    })
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Verifies the connection is migrated and exposes the expected table shape.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
