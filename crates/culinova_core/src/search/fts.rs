//! SQLite FTS5-based recipe search.
//!
//! # Responsibility
//! - Provide keyword search over recipe titles and notes.
//! - Return typed hits with stable recipe IDs.
//!
//! # Invariants
//! - Result ordering is deterministic by rank, `updated_at` and uuid.
//! - Blank queries never reach SQLite.

use crate::db::DbError;
use crate::model::recipe::RecipeId;
use crate::model::user::UserId;
use crate::repo::normalize_list_limit;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// Query cannot be parsed as FTS5 syntax.
    InvalidQuery {
        query: String,
        message: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidQuery { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for recipe lookup.
#[derive(Debug, Clone)]
pub struct RecipeSearchQuery {
    pub text: String,
    /// Restricts hits to one owner's recipes.
    pub owner: Option<UserId>,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Passes `text` through as a raw FTS5 expression.
    ///
    /// Off by default so type-as-you-search input never fails on syntax.
    pub raw_fts_syntax: bool,
}

impl RecipeSearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner: None,
            limit: None,
            raw_fts_syntax: false,
        }
    }

    pub fn for_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSearchHit {
    pub recipe_id: RecipeId,
    pub title: String,
    /// Matched fragment with hits wrapped in `[` `]`.
    pub snippet: String,
}

/// Searches recipes via FTS5 and returns ranked hits.
pub fn search_recipes(
    conn: &Connection,
    query: &RecipeSearchQuery,
) -> SearchResult<Vec<RecipeSearchHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };

    let mut sql = String::from(
        "SELECT
            r.uuid AS uuid,
            r.title AS title,
            snippet(recipes_fts, -1, '[', ']', ' ... ', 10) AS snippet
         FROM recipes_fts
         JOIN recipes r ON r.uuid = recipes_fts.recipe_uuid
         WHERE recipes_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if let Some(owner) = query.owner {
        sql.push_str(" AND r.owner_uuid = ?");
        bind_values.push(Value::Text(owner.to_string()));
    }

    sql.push_str(" ORDER BY bm25(recipes_fts), r.updated_at DESC, r.uuid ASC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(row)?);
    }

    log::debug!(
        "event=recipe_search module=search status=ok hits={} owner_scoped={}",
        hits.len(),
        query.owner.is_some()
    );
    Ok(hits)
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<RecipeSearchHit> {
    let uuid_text: String = row.get("uuid")?;
    let recipe_id = Uuid::parse_str(&uuid_text)
        .map_err(|_| SearchError::InvalidData(format!("invalid uuid `{uuid_text}`")))?;

    Ok(RecipeSearchHit {
        recipe_id,
        title: row.get("title")?,
        snippet: row.get("snippet")?,
    })
}

fn build_match_expression(query: &RecipeSearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }
    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();
    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_match_expression, RecipeSearchQuery};

    #[test]
    fn user_terms_are_quoted_and_joined_with_and() {
        let query = RecipeSearchQuery::new("  garlic \"bread  ");
        assert_eq!(
            build_match_expression(&query).as_deref(),
            Some("\"garlic\" AND \"\"\"bread\"")
        );
    }

    #[test]
    fn blank_query_builds_nothing() {
        assert_eq!(build_match_expression(&RecipeSearchQuery::new(" \t")), None);
    }
}
