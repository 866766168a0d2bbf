use diesel::result::Error as DieselError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Custom error type for allocation-related operations
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
    #[error("Allocation percentages sum to {0}, expected 100 (within 0.01)")]
    InvalidPercentTotal(Decimal),
    #[error("Source transaction {0} is not pending")]
    SourceNotPending(String),
    #[error("Source transaction {0} is not processed")]
    SourceNotProcessed(String),
}

impl From<DieselError> for AllocationError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AllocationError::NotFound("Record not found".to_string()),
            _ => AllocationError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, AllocationError>;
