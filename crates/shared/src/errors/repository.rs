use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i32,
        requested: i32,
        available: i32,
    },

    #[error("Store call timed out: {0}")]
    Timeout(String),

    #[error("Custom: {0}")]
    Custom(String),
}

impl RepositoryError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Timeout(_) => true,
            RepositoryError::Sqlx(err) => matches!(
                err,
                SqlxError::Io(_)
                    | SqlxError::PoolTimedOut
                    | SqlxError::PoolClosed
                    | SqlxError::WorkerCrashed
            ),
            _ => false,
        }
    }

    /// Maps unique and foreign key violations onto the matching variants.
    pub fn from_constraint(err: SqlxError, what: &str) -> Self {
        if let SqlxError::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return RepositoryError::AlreadyExists(what.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::ForeignKey(what.to_string());
            }
        }
        RepositoryError::Sqlx(err)
    }
}
