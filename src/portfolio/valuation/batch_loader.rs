use chrono::NaiveDate;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

use crate::dividends::{Dividend, DividendRepositoryTrait};
use crate::holdings::{Holding, HoldingError, HoldingRepositoryTrait};
use crate::market_data::{MarketDataRepositoryTrait, PricePoint};
use crate::transactions::{Transaction, TransactionRepositoryTrait};
use crate::Result;

/// Everything a valuation run needs, loaded up front.
#[derive(Debug, Clone)]
pub struct ValuationInputs {
    pub holdings: Vec<Holding>,
    pub transactions: Vec<Transaction>,
    pub prices: Vec<PricePoint>,
    pub dividends: Vec<Dividend>,
}

/// Loads every transaction, price and dividend relevant to a holding set
/// with one bulk query per collection, regardless of how many holdings or
/// days are requested. All subsequent work happens in memory.
pub struct BatchLoader {
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
}

impl BatchLoader {
    /// Creates a new BatchLoader instance with injected dependencies
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
    ) -> Self {
        Self {
            holding_repository,
            transaction_repository,
            market_data_repository,
            dividend_repository,
        }
    }

    /// Loads the inputs for the given holdings up to and including
    /// `up_to`. Rows after `up_to` are irrelevant and excluded; earlier
    /// rows are required to establish starting state. Fails when any
    /// requested holding does not exist.
    pub fn load(&self, holding_ids: &[String], up_to: NaiveDate) -> Result<ValuationInputs> {
        let holdings = self.holding_repository.get_by_ids(holding_ids)?;

        let found: HashSet<&str> = holdings.iter().map(|h| h.id.as_str()).collect();
        let missing: Vec<&str> = holding_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !found.contains(id))
            .collect();
        if !missing.is_empty() {
            return Err(HoldingError::NotFound(format!(
                "Unknown holdings: {}",
                missing.join(", ")
            ))
            .into());
        }

        let mut fund_ids: Vec<String> = holdings.iter().map(|h| h.fund_id.clone()).collect();
        fund_ids.sort();
        fund_ids.dedup();

        let transactions = self
            .transaction_repository
            .get_transactions_for_holdings(holding_ids, Some(up_to))?;
        let prices = self
            .market_data_repository
            .get_prices_for_funds(&fund_ids, Some(up_to))?;
        let dividends = self
            .dividend_repository
            .get_dividends_for_holdings(holding_ids)?;

        debug!(
            "Loaded {} transactions, {} prices and {} dividends for {} holdings up to {}",
            transactions.len(),
            prices.len(),
            dividends.len(),
            holdings.len(),
            up_to
        );

        Ok(ValuationInputs {
            holdings,
            transactions,
            prices,
            dividends,
        })
    }
}
