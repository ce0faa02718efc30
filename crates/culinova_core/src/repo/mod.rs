//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate records before SQL mutations.
//! - Multi-row writes run inside one immediate transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::recipe::RecipeValidationError;
use crate::model::user::UserValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod recipe_repo;
pub mod step_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all persistence contracts.
#[derive(Debug)]
pub enum RepoError {
    RecipeValidation(RecipeValidationError),
    UserValidation(UserValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    /// Unique or check constraint rejected the write.
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecipeValidation(err) => write!(f, "{err}"),
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RecipeValidation(err) => Some(err),
            Self::UserValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecipeValidationError> for RepoError {
    fn from(value: RecipeValidationError) -> Self {
        Self::RecipeValidation(value)
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
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

/// Maps constraint violations to `Conflict`, everything else to `Db`.
pub(crate) fn map_write_error(err: rusqlite::Error, context: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::Conflict(format!("{context}: {err}"))
        }
        _ => RepoError::from(err),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

/// List limit defaults and cap shared by list contracts.
pub const LIST_DEFAULT_LIMIT: u32 = 20;
pub const LIST_LIMIT_MAX: u32 = 100;

/// Normalizes list limit: `None`/`0` → default, values above the cap clamp.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
    }
}
