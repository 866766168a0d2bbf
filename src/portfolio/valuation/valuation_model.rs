use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_serde::decimal_serde;

/// Valuation of one holding at the close of one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyHoldingValuation {
    pub holding_id: String,
    pub portfolio_id: String,
    pub valuation_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    /// Last known price on or before the date; zero when none is stored.
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    /// False when no price exists on or before the date. The market value
    /// is reported as zero in that case, never as an error.
    pub priced: bool,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
}

/// Aggregate valuation of one portfolio at the close of one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPortfolioValuation {
    pub portfolio_id: String,
    pub valuation_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
}

impl DailyPortfolioValuation {
    pub(crate) fn empty(portfolio_id: &str, valuation_date: NaiveDate) -> Self {
        DailyPortfolioValuation {
            portfolio_id: portfolio_id.to_string(),
            valuation_date,
            market_value: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            unrealized_gain: Decimal::ZERO,
        }
    }

    pub(crate) fn add(&mut self, holding: &DailyHoldingValuation) {
        self.market_value += holding.market_value;
        self.cost_basis += holding.cost_basis;
        self.realized_gain += holding.realized_gain;
        self.unrealized_gain += holding.unrealized_gain;
    }

    pub(crate) fn merge(&mut self, other: &DailyPortfolioValuation) {
        self.market_value += other.market_value;
        self.cost_basis += other.cost_basis;
        self.realized_gain += other.realized_gain;
        self.unrealized_gain += other.unrealized_gain;
    }
}

/// One day of the computed series: holding rows, portfolio aggregates and
/// the grand total over every portfolio in the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyValuationSummary {
    pub valuation_date: NaiveDate,
    pub holdings: Vec<DailyHoldingValuation>,
    pub portfolios: Vec<DailyPortfolioValuation>,
    pub total: DailyPortfolioValuation,
}

/// Time series of daily valuations over an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSeries {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DailyValuationSummary>,
}

/// Point-in-time position of a single holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub holding_id: String,
    pub as_of: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub average_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    pub priced: bool,
}
