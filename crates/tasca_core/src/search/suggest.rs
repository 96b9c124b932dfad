//! Name-based search suggestions.
//!
//! # Responsibility
//! - Return `(id, name)` pairs whose name contains the typed text.
//!
//! # Invariants
//! - Blank queries and zero limits return no hits without touching SQL.
//! - `%`, `_` and `\` in user text match literally.
//! - Ordering is deterministic: name, then id.

use crate::model::tasca::TascaId;
use crate::repo::tasca_repo::{like_pattern, parse_uuid, RepoResult};
use rusqlite::{params, Connection};

const SUGGESTIONS_DEFAULT_LIMIT: u32 = 10;

/// Options for one suggestion lookup.
#[derive(Debug, Clone)]
pub struct SuggestionQuery {
    /// Text typed so far.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl SuggestionQuery {
    /// Creates a query with the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: SUGGESTIONS_DEFAULT_LIMIT,
        }
    }
}

/// Single suggestion hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub id: TascaId,
    pub name: String,
}

/// Looks up tascas whose name contains the query text.
pub fn search_suggestions(
    conn: &Connection,
    query: &SuggestionQuery,
) -> RepoResult<Vec<Suggestion>> {
    let text = query.text.trim();
    if text.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, name
         FROM tascas
         WHERE name LIKE ?1 ESCAPE '\\'
         ORDER BY name COLLATE NOCASE ASC, id ASC
         LIMIT ?2;",
    )?;
    let mut rows = stmt.query(params![like_pattern(text), i64::from(query.limit)])?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        hits.push(Suggestion {
            id: parse_uuid(&id_text, "tascas.id")?,
            name: row.get("name")?,
        });
    }

    Ok(hits)
}
