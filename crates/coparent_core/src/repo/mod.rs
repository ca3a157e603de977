//! Persistence gateway: repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for profiles, schedule
//!   configs and change requests.
//! - Keep SQL details out of services and resolvers.
//!
//! # Invariants
//! - Schedule config writes call `ScheduleConfig::validate()` first.
//! - Read paths reject malformed rows with `InvalidData` instead of masking
//!   them, except unknown pattern ids, which fall back to the catalog default.
//! - Change-request status moves only through the conditional write in
//!   `ChangeRequestRepository::resolve_pending`.

use crate::db::DbError;
use crate::model::schedule::ScheduleValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod change_request_repo;
pub mod profile_repo;
pub mod schedule_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every SQLite gateway.
#[derive(Debug)]
pub enum RepoError {
    Validation(ScheduleValidationError),
    /// Transport failure; retryable.
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    /// Write refused because it contradicts stored state.
    Conflict(String),
    InvalidData(String),
}

impl RepoError {
    /// Whether the caller may retry the same call unchanged.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
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
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ScheduleValidationError> for RepoError {
    fn from(value: ScheduleValidationError) -> Self {
        Self::Validation(value)
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

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_date(value: &str, column: &'static str) -> RepoResult<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Fails fast when a connection did not come from `db::open_db*`.
pub(crate) fn ensure_table(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::InvalidData(format!(
            "required table `{table}` is missing; open the database through db::open_db"
        )))
    }
}
