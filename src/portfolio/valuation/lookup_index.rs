use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::market_data::PricePoint;
use crate::portfolio::position::ledger_order;
use crate::transactions::Transaction;

/// Transactions grouped by holding, each group in replay order.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    by_holding: HashMap<String, Vec<Transaction>>,
}

impl TransactionIndex {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let mut by_holding: HashMap<String, Vec<Transaction>> = HashMap::new();
        for transaction in transactions {
            by_holding
                .entry(transaction.holding_id.clone())
                .or_default()
                .push(transaction);
        }
        for group in by_holding.values_mut() {
            group.sort_by(|a, b| ledger_order(a, b));
        }
        TransactionIndex { by_holding }
    }

    pub fn for_holding(&self, holding_id: &str) -> &[Transaction] {
        self.by_holding
            .get(holding_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Per-fund price table supporting "last known price on or before a date".
#[derive(Debug, Default)]
pub struct PriceIndex {
    by_fund: HashMap<String, Vec<(NaiveDate, Decimal)>>,
}

impl PriceIndex {
    pub fn new(prices: Vec<PricePoint>) -> Self {
        let mut by_fund: HashMap<String, Vec<(NaiveDate, Decimal)>> = HashMap::new();
        for point in prices {
            by_fund
                .entry(point.fund_id.clone())
                .or_default()
                .push((point.price_date, point.price));
        }
        for series in by_fund.values_mut() {
            series.sort_by_key(|(date, _)| *date);
        }
        PriceIndex { by_fund }
    }

    /// Forward-filled lookup: the most recent stored price on or before
    /// `date`, or `None` when the fund has no price that early.
    pub fn latest_on_or_before(&self, fund_id: &str, date: NaiveDate) -> Option<Decimal> {
        let series = self.by_fund.get(fund_id)?;
        let upper = series.partition_point(|(price_date, _)| *price_date <= date);
        if upper == 0 {
            None
        } else {
            Some(series[upper - 1].1)
        }
    }
}
