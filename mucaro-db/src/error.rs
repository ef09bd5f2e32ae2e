/// Error types for the database layer
///
/// Every public operation in this crate returns `Result<T, DbError>`.
/// Raw `sqlx::Error` values never cross the crate boundary; they are
/// translated here so callers can map failures to HTTP statuses without
/// knowing anything about the driver.
///
/// Not-found is deliberately NOT an error: ownership-scoped lookups return
/// `Ok(None)` whether the row is missing or belongs to another user, so the
/// two cases are indistinguishable to the caller.

use thiserror::Error;

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Unified error type for the database layer
#[derive(Debug, Error)]
pub enum DbError {
    /// Connection configuration is missing or malformed (fatal at startup)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The storage engine is unreachable, the pool is exhausted, or a
    /// timeout elapsed (recoverable; callers typically respond 503)
    #[error("database connection error: {0}")]
    Connection(String),

    /// A migration script failed or the script ordering invariant was
    /// violated (fatal for this process's startup; already-applied
    /// migrations stay committed)
    #[error("migration error: {0}")]
    Migration(String),

    /// A payload failed schema validation before reaching storage
    /// (caller's fault; no mutation was performed)
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A unique or foreign-key constraint was violated by the storage
    /// engine (caller's fault; 409/400 depending on the constraint)
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// Name of the violated constraint, when this is a constraint error
    /// raised by Postgres with an attached constraint name
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            DbError::Constraint(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                // Postgres class 23 = integrity constraint violation
                let is_constraint = db_err
                    .code()
                    .map(|c| c.starts_with("23"))
                    .unwrap_or(false);

                if is_constraint || db_err.constraint().is_some() {
                    let name = db_err
                        .constraint()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| db_err.message().to_string());
                    DbError::Constraint(name)
                } else {
                    DbError::Connection(db_err.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => {
                DbError::Connection("timed out waiting for a pool connection".to_string())
            }
            sqlx::Error::PoolClosed => {
                DbError::Connection("connection pool is closed".to_string())
            }
            sqlx::Error::Io(e) => DbError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DbError::Connection(e.to_string()),
            other => DbError::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_connection() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Connection(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_pool_closed_maps_to_connection() {
        let err = DbError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn test_constraint_name_accessor() {
        let err = DbError::Constraint("users_email_key".to_string());
        assert_eq!(err.constraint_name(), Some("users_email_key"));

        let err = DbError::Connection("refused".to_string());
        assert_eq!(err.constraint_name(), None);
    }

    #[test]
    fn test_display_formats() {
        let err = DbError::Configuration("DB_PORT missing".to_string());
        assert_eq!(err.to_string(), "configuration error: DB_PORT missing");

        let err = DbError::Migration("0002 failed".to_string());
        assert_eq!(err.to_string(), "migration error: 0002 failed");
    }
}
