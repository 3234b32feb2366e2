use thiserror::Error;

/// Failures surfaced by the persistence layer.
///
/// A lookup that yields no row is never an error: single-entity lookups
/// return an empty `Option` and list queries an empty `Vec`. Everything
/// else propagates here and fails the enclosing transaction boundary.
#[derive(Debug, Error)]
pub enum DataError {
    /// A unique, foreign-key, not-null, or check constraint was violated.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A query expression or its parameter bindings are malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The session was used after commit or rollback.
    #[error("session is closed")]
    SessionClosed,

    /// Any other failure from the storage backend.
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    return DataError::ConstraintViolation(db.message().to_string());
                }
                _ => {}
            }
        }
        DataError::Database(err)
    }
}
