//! Review repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append reviews and read them back per tasca.
//!
//! # Invariants
//! - Write paths call `Review::validate()` and require the parent tasca.
//! - Reviews for one tasca are returned newest first.

use crate::model::review::{Review, ReviewId};
use crate::model::tasca::TascaId;
use crate::repo::tasca_repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, now_epoch_ms, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};

const REVIEW_COLUMNS: &[&str] = &[
    "id",
    "tasca_id",
    "user_nick",
    "comida",
    "ambiente",
    "preco_justo",
    "comment",
    "created_at",
    "pending_sync",
];

/// Repository interface for review storage.
pub trait ReviewRepository {
    /// Inserts one review, stamping `created_at` when absent.
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId>;
    /// Lists reviews of one tasca ordered by `created_at DESC`.
    fn list_reviews_for_tasca(&self, tasca_id: TascaId) -> RepoResult<Vec<Review>>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "reviews", REVIEW_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_review(&self, review: &Review) -> RepoResult<ReviewId> {
        review.validate()?;

        let tasca_id = review.tasca_id.to_string();
        if !tasca_exists(self.conn, &tasca_id)? {
            return Err(RepoError::NotFound(review.tasca_id));
        }

        self.conn.execute(
            "INSERT INTO reviews (
                id,
                tasca_id,
                user_nick,
                comida,
                ambiente,
                preco_justo,
                comment,
                created_at,
                pending_sync
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                review.id.to_string(),
                tasca_id,
                review.user_nick.as_str(),
                review.comida,
                review.ambiente,
                review.preco_justo,
                review.comment.as_str(),
                review.created_at.unwrap_or_else(now_epoch_ms),
                bool_to_int(review.pending_sync),
            ],
        )?;

        Ok(review.id)
    }

    fn list_reviews_for_tasca(&self, tasca_id: TascaId) -> RepoResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                tasca_id,
                user_nick,
                comida,
                ambiente,
                preco_justo,
                comment,
                created_at,
                pending_sync
             FROM reviews
             WHERE tasca_id = ?1
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([tasca_id.to_string()])?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(row)?);
        }
        Ok(reviews)
    }
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    let id_text: String = row.get("id")?;
    let tasca_text: String = row.get("tasca_id")?;

    Ok(Review {
        id: parse_uuid(&id_text, "reviews.id")?,
        tasca_id: parse_uuid(&tasca_text, "reviews.tasca_id")?,
        user_nick: row.get("user_nick")?,
        comida: row.get("comida")?,
        ambiente: row.get("ambiente")?,
        preco_justo: row.get("preco_justo")?,
        comment: row.get("comment")?,
        created_at: Some(row.get("created_at")?),
        pending_sync: int_to_bool(row.get("pending_sync")?, "reviews.pending_sync")?,
    })
}

fn tasca_exists(conn: &Connection, tasca_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tascas WHERE id = ?1);",
        [tasca_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
