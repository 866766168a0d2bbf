use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for market-data operations
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for MarketDataError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => MarketDataError::NotFound("Record not found".to_string()),
            _ => MarketDataError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for market-data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;
