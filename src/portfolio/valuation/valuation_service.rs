use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::constants::{PORTFOLIO_TOTAL_ID, ROUNDING_SCALE};
use crate::dividends::DividendRepositoryTrait;
use crate::errors::ValidationError;
use crate::holdings::{HoldingError, HoldingRepositoryTrait};
use crate::market_data::MarketDataRepositoryTrait;
use crate::portfolio::position::position_calculator::apply_transaction;
use crate::portfolio::position::{PositionCalculator, PositionState};
use crate::transactions::TransactionRepositoryTrait;
use crate::Result;

use super::batch_loader::BatchLoader;
use super::lookup_index::{PriceIndex, TransactionIndex};
use super::valuation_model::*;

/// Computes historical valuations by replaying ledgers in memory.
///
/// One bulk load per request, then a single ascending pass over the date
/// range: per-holding state is carried across days, never reset, and the
/// forward-filled price is joined in per day. No storage access happens
/// inside the loop, so a series over N days and H holdings is O(N·H)
/// in-memory work after the load.
pub struct ValuationService {
    batch_loader: BatchLoader,
    calculator: PositionCalculator,
}

impl ValuationService {
    /// Creates a new ValuationService instance with injected dependencies
    pub fn new(
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
    ) -> Self {
        Self {
            batch_loader: BatchLoader::new(
                holding_repository,
                transaction_repository,
                market_data_repository,
                dividend_repository,
            ),
            calculator: PositionCalculator::new(),
        }
    }

    /// Computes the daily valuation series for the given holdings over the
    /// inclusive `[start_date, end_date]` range.
    pub fn compute_series(
        &self,
        holding_ids: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ValuationSeries> {
        if start_date > end_date {
            return Err(ValidationError::InvalidInput(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            ))
            .into());
        }

        let inputs = self.batch_loader.load(holding_ids, end_date)?;
        let transaction_index = TransactionIndex::new(inputs.transactions);
        let price_index = PriceIndex::new(inputs.prices);

        let mut holdings = inputs.holdings;
        holdings.sort_by(|a, b| {
            (a.portfolio_id.as_str(), a.id.as_str()).cmp(&(b.portfolio_id.as_str(), b.id.as_str()))
        });

        // Rows dated before the range seed the starting state; the rest
        // are consumed day by day through a per-holding cursor.
        let mut states: Vec<PositionState> = Vec::with_capacity(holdings.len());
        let mut cursors: Vec<usize> = Vec::with_capacity(holdings.len());
        for holding in &holdings {
            let rows = transaction_index.for_holding(&holding.id);
            let first_in_range = rows.partition_point(|t| t.transaction_date < start_date);
            let mut state = PositionState::new(&holding.id);
            for transaction in &rows[..first_in_range] {
                apply_transaction(&mut state, transaction)?;
            }
            states.push(state);
            cursors.push(first_in_range);
        }

        let mut missing_price_logged: HashSet<String> = HashSet::new();
        let mut days = Vec::new();

        for date in days_in_range(start_date, end_date) {
            let mut holding_rows = Vec::with_capacity(holdings.len());
            let mut portfolios: BTreeMap<String, DailyPortfolioValuation> = BTreeMap::new();

            for (index, holding) in holdings.iter().enumerate() {
                let rows = transaction_index.for_holding(&holding.id);
                while cursors[index] < rows.len()
                    && rows[cursors[index]].transaction_date == date
                {
                    apply_transaction(&mut states[index], &rows[cursors[index]])?;
                    cursors[index] += 1;
                }

                let state = &states[index];
                let looked_up = price_index.latest_on_or_before(&holding.fund_id, date);
                let priced = looked_up.is_some();
                if !priced
                    && !state.shares.is_zero()
                    && missing_price_logged.insert(holding.id.clone())
                {
                    warn!(
                        "No price on or before {} for fund {} (holding {}); market value reported as zero",
                        date, holding.fund_id, holding.id
                    );
                }

                let price = looked_up.unwrap_or(Decimal::ZERO);
                let market_value = (state.shares * price).round_dp(ROUNDING_SCALE);
                let unrealized_gain = if state.shares.is_zero() {
                    Decimal::ZERO
                } else {
                    market_value - state.cost_basis
                };

                let row = DailyHoldingValuation {
                    holding_id: holding.id.clone(),
                    portfolio_id: holding.portfolio_id.clone(),
                    valuation_date: date,
                    shares: state.shares,
                    price,
                    priced,
                    market_value,
                    cost_basis: state.cost_basis,
                    realized_gain: state.realized_gain,
                    unrealized_gain,
                };

                portfolios
                    .entry(holding.portfolio_id.clone())
                    .or_insert_with(|| DailyPortfolioValuation::empty(&holding.portfolio_id, date))
                    .add(&row);
                holding_rows.push(row);
            }

            let mut total = DailyPortfolioValuation::empty(PORTFOLIO_TOTAL_ID, date);
            for portfolio in portfolios.values() {
                total.merge(portfolio);
            }

            days.push(DailyValuationSummary {
                valuation_date: date,
                holdings: holding_rows,
                portfolios: portfolios.into_values().collect(),
                total,
            });
        }

        debug!(
            "Computed valuation series for {} holdings over {} days",
            holdings.len(),
            days.len()
        );

        Ok(ValuationSeries {
            start_date,
            end_date,
            days,
        })
    }

    /// Replays the full ledger of one holding to today and joins in the
    /// latest known price.
    pub fn get_current_position(&self, holding_id: &str) -> Result<PositionSummary> {
        let as_of = chrono::Utc::now().date_naive();
        let ids = vec![holding_id.to_string()];
        let inputs = self.batch_loader.load(&ids, as_of)?;

        let holding = inputs.holdings.into_iter().next().ok_or_else(|| {
            HoldingError::NotFound(format!("Holding with id {} not found", holding_id))
        })?;

        let state = self
            .calculator
            .replay(holding_id, &inputs.transactions, Some(as_of))?;

        let price_index = PriceIndex::new(inputs.prices);
        let looked_up = price_index.latest_on_or_before(&holding.fund_id, as_of);
        let priced = looked_up.is_some();
        let price = looked_up.unwrap_or(Decimal::ZERO);
        let market_value = (state.shares * price).round_dp(ROUNDING_SCALE);
        let unrealized_gain = if state.shares.is_zero() {
            Decimal::ZERO
        } else {
            market_value - state.cost_basis
        };

        Ok(PositionSummary {
            holding_id: holding.id,
            as_of,
            shares: state.shares,
            average_cost: state.average_cost(),
            cost_basis: state.cost_basis,
            realized_gain: state.realized_gain,
            market_value,
            unrealized_gain,
            priced,
        })
    }
}

fn days_in_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}
