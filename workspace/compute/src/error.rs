use std::sync::PoisonError;

use model::UnknownFrequency;
use thiserror::Error;
use tracing::error;

/// Error types for the ledger core
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed input, rejected before anything is written
    #[error("Validation error: {0}")]
    Validation(String),

    /// The addressed record does not exist
    #[error("{entity} with id {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Failure inside a non-database store
    #[error("Store error: {0}")]
    Store(String),

    /// Calendar arithmetic left the supported date range
    #[error("Date error: {0}")]
    Date(String),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Persistence failures are the only errors worth retrying.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, LedgerError::Database(_) | LedgerError::Store(_))
    }
}

impl From<UnknownFrequency> for LedgerError {
    fn from(error: UnknownFrequency) -> Self {
        LedgerError::Validation(error.to_string())
    }
}

impl<T> From<PoisonError<T>> for LedgerError {
    fn from(error: PoisonError<T>) -> Self {
        let err = LedgerError::Store(format!("store lock poisoned: {}", error));
        error!(?err, "Memory store lock poisoned");
        err
    }
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;
