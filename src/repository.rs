use thiserror::Error;

/// Errors shared by the persistence-layer repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

/// Map a constraint violation to its domain meaning, leaving other errors
/// untouched. Uniqueness pre-checks are advisory only; the database
/// constraint is the source of truth under concurrency. A duplicate row
/// (UNIQUE/PRIMARY KEY) becomes a conflict carrying the caller's message,
/// while a foreign-key failure means the referenced row does not exist.
pub fn constraint_to_conflict(err: RepositoryError, message: &str) -> RepositoryError {
    match &err {
        RepositoryError::Sql(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                RepositoryError::NotFound("referenced record".to_string())
            } else {
                RepositoryError::Conflict(message.to_string())
            }
        }
        _ => err,
    }
}
