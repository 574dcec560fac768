//! # Database Error Types
//!
//! Error types for store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├──► RowFailure::Store in a BatchReport (bulk import)            │
//! │       │                                                                 │
//! │       └──► ApiError (HTTP app) ← Serialized for clients                │
//! │                                                                         │
//! │  Only `Unavailable` is retryable; everything else needs the caller     │
//! │  to change its input.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rxdict_core::{RowFailure, ValidationError};
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - ID doesn't exist
    /// - Record was deleted (deletes are hard, ids are never reused)
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input failed validation before reaching SQL.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unique constraint violation.
    ///
    /// The drug table has no uniqueness constraint on the duplicate key, so
    /// this only surfaces on id collisions or future constraints.
    #[error("Conflict on {field}")]
    Conflict { field: String },

    /// Persistence is temporarily unavailable.
    ///
    /// ## When This Occurs
    /// - Connection refused/lost, pool closed
    /// - Pool exhausted (acquire timed out)
    /// - Database busy or locked by another writer
    /// - Disk I/O error
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed for a non-transient reason.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Unavailable(_))
    }

    /// Converts into the per-row failure recorded by bulk import.
    pub fn into_row_failure(self) -> RowFailure {
        match self {
            DbError::Validation(e) => RowFailure::Validation(e),
            other => RowFailure::Store {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

/// SQLite result codes (primary code is the low byte) that mean "try again".
fn is_transient_code(code: &str) -> bool {
    // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_IOERR (10), SQLITE_FULL (13),
    // SQLITE_CANTOPEN (14)
    match code.parse::<i32>() {
        Ok(code) => matches!(code & 0xff, 5 | 6 | 10 | 13 | 14),
        Err(_) => false,
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound      → DbError::NotFound
/// sqlx::Error::Database (busy,
///   locked, I/O, full)          → DbError::Unavailable
/// sqlx::Error::Database (UNIQUE)→ DbError::Conflict
/// sqlx::Error::Io / Pool*       → DbError::Unavailable
/// Other                         → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                let transient = db_err.code().is_some_and(|c| is_transient_code(&c));

                if transient {
                    DbError::Unavailable(msg)
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::Conflict { field }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::Io(e) => DbError::Unavailable(e.to_string()),

            sqlx::Error::PoolTimedOut => DbError::Unavailable("Connection pool exhausted".to_string()),

            sqlx::Error::PoolClosed => DbError::Unavailable("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
