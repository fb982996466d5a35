//! Error types for the roster-search crate

use query_object::QueryError;
use thiserror::Error;

/// Failure of a search or bulk operation
#[derive(Error, Debug)]
pub enum SearchError {
    /// Negative page, non-positive size or a size above the configured maximum.
    /// Raised before any query is issued.
    #[error("Invalid page request: page {page}, size {size}")]
    InvalidPageRequest { page: i64, size: i64 },

    #[error("Data access failure: {0}")]
    DataAccessFailure(#[from] QueryError),

    #[error("Row mapping error: {0}")]
    RowMapping(#[from] serde_json::Error),
}

/// Rejected roster mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("Unknown team: {0}")]
    UnknownTeam(i64),

    #[error("Unknown member: {0}")]
    UnknownMember(i64),

    #[error("Age cannot be negative: {0}")]
    NegativeAge(i32),
}

impl From<RosterError> for QueryError {
    fn from(error: RosterError) -> Self {
        match error {
            RosterError::NegativeAge(_) | RosterError::UnknownTeam(_) => {
                QueryError::ConstraintViolation(error.to_string())
            }
            RosterError::UnknownMember(_) => QueryError::InvalidQuery(error.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RosterSearchError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
