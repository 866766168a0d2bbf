pub mod db;

pub mod allocations;
pub mod dividends;
pub mod funds;
pub mod holdings;
pub mod market_data;
pub mod portfolios;
pub mod transactions;

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod schema;
pub mod utils;

pub use errors::{Error, Result};
pub use portfolio::*;
pub use transactions::*;
