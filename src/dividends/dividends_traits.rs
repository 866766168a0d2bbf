use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::transactions::NewRealizedGain;

use super::dividends_errors::Result;
use super::dividends_model::*;

/// Trait defining the contract for dividend repository operations.
pub trait DividendRepositoryTrait: Send + Sync {
    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend>;
    fn get_dividends_for_holding(&self, holding_id: &str) -> Result<Vec<Dividend>>;
    /// Bulk load for a set of holdings in one query, sorted by record date.
    fn get_dividends_for_holdings(&self, holding_ids: &[String]) -> Result<Vec<Dividend>>;
    fn insert_dividend(
        &self,
        dividend: DividendDB,
        sync: ReinvestmentSync,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend>;
    fn update_dividend(
        &self,
        dividend: DividendDB,
        sync: ReinvestmentSync,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend>;
    /// Deletes a dividend, cascading to its reinvestment transaction.
    fn delete_dividend(
        &self,
        dividend_id: &str,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend>;
}

/// Trait defining the contract for dividend service operations.
#[async_trait::async_trait]
pub trait DividendServiceTrait: Send + Sync {
    fn get_dividend(&self, dividend_id: &str) -> crate::Result<Dividend>;
    fn get_dividends_for_holding(&self, holding_id: &str) -> crate::Result<Vec<Dividend>>;
    /// Shares held as of `date`, replayed from the ledger. Recomputed on
    /// every call; never read from a stored column.
    fn shares_owned_at(&self, holding_id: &str, date: NaiveDate) -> crate::Result<Decimal>;
    async fn create_dividend(&self, new_dividend: NewDividend) -> crate::Result<Dividend>;
    async fn update_dividend(&self, dividend_update: DividendUpdate) -> crate::Result<Dividend>;
    async fn delete_dividend(&self, dividend_id: &str) -> crate::Result<Dividend>;
}
