use chrono::NaiveDate;
use diesel::result::Error as DieselError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::allocations::AllocationError;
use crate::dividends::DividendError;
use crate::funds::FundError;
use crate::holdings::HoldingError;
use crate::market_data::MarketDataError;
use crate::portfolios::PortfolioError;
use crate::transactions::TransactionError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Position calculation failed: {0}")]
    Calculator(#[from] CalculatorError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("Fund error: {0}")]
    Fund(#[from] FundError),

    #[error("Holding error: {0}")]
    Holding(#[from] HoldingError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Dividend error: {0}")]
    Dividend(#[from] DividendError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] diesel::result::ConnectionError),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(#[from] r2d2::Error),

    #[error("Database query failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Errors raised while replaying a holding's ledger
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("sell of {requested} shares on {date} exceeds the {available} currently held")]
    Oversell {
        requested: Decimal,
        available: Decimal,
        date: NaiveDate,
    },

    #[error("Unsupported transaction type: {0}")]
    UnsupportedTransactionType(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}

// Implement From for DieselError to Error directly
impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        Error::Database(DatabaseError::QueryFailed(err))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Database(DatabaseError::PoolCreationFailed(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}
