use chrono::NaiveDate;

use super::market_data_errors::Result;
use super::market_data_model::{NewPricePoint, PricePoint};

/// Trait defining the contract for market-data repository operations.
pub trait MarketDataRepositoryTrait: Send + Sync {
    /// Bulk load of every stored price for a set of funds in one query,
    /// optionally bounded by an inclusive upper date.
    fn get_prices_for_funds(
        &self,
        fund_ids: &[String],
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>>;
    /// Inserts or overwrites price points; one row per (fund, date).
    fn upsert_price_points(&self, new_prices: Vec<NewPricePoint>) -> Result<usize>;
    fn delete_price_point(&self, price_point_id: &str) -> Result<()>;
}
