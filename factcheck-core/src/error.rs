use std::collections::BTreeMap;

use thiserror::Error;

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum FactError {
    #[error("Not found.")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl FactError {
    /// True when the failure is the connection pool running dry or shutting
    /// down, as opposed to a failed lookup.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            FactError::Database(sqlx::Error::PoolTimedOut) | FactError::Database(sqlx::Error::PoolClosed)
        )
    }
}

pub type Result<T> = std::result::Result<T, FactError>;
