use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use crate::constants::ROUNDING_SCALE;
use crate::errors::CalculatorError;
use crate::transactions::{Transaction, TransactionType};

use super::position_model::PositionState;

pub type Result<T> = std::result::Result<T, CalculatorError>;

/// Realized gain produced by a single sell during a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct SellGain {
    pub transaction_id: String,
    pub amount: Decimal,
}

/// Chronological ledger order with a stable same-day tie-break.
///
/// Same-day rows replay in insertion order (`created_at`), with the id as
/// the final tie-break so the order is total and replays are deterministic.
pub fn ledger_order(a: &Transaction, b: &Transaction) -> Ordering {
    a.transaction_date
        .cmp(&b.transaction_date)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Replays a holding's transactions chronologically to reconstruct its
/// share count, cost basis and cumulative realized gain.
///
/// The replay is a pure fold from the empty state; querying the state as
/// of a date means replaying everything up to that date. There is no
/// incremental undo.
#[derive(Default, Debug, Clone)]
pub struct PositionCalculator {}

impl PositionCalculator {
    /// Creates a new instance of the PositionCalculator.
    pub fn new() -> Self {
        PositionCalculator {}
    }

    /// Replays `transactions` for `holding_id` up to and including `as_of`
    /// (the whole ledger when `None`) and returns the resulting state.
    pub fn replay(
        &self,
        holding_id: &str,
        transactions: &[Transaction],
        as_of: Option<NaiveDate>,
    ) -> Result<PositionState> {
        self.replay_with_sell_gains(holding_id, transactions, as_of)
            .map(|(state, _)| state)
    }

    /// Same as [`replay`](Self::replay), additionally returning the
    /// realized gain each sell produced, in replay order.
    pub fn replay_with_sell_gains(
        &self,
        holding_id: &str,
        transactions: &[Transaction],
        as_of: Option<NaiveDate>,
    ) -> Result<(PositionState, Vec<SellGain>)> {
        let mut ordered: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.holding_id == holding_id)
            .filter(|t| as_of.map_or(true, |date| t.transaction_date <= date))
            .collect();
        ordered.sort_by(|a, b| ledger_order(a, b));

        debug!(
            "Replaying {} transactions for holding {}",
            ordered.len(),
            holding_id
        );

        let mut state = PositionState::new(holding_id);
        let mut sell_gains = Vec::new();

        for transaction in ordered {
            if let Some(gain) = apply_transaction(&mut state, transaction)? {
                sell_gains.push(SellGain {
                    transaction_id: transaction.id.clone(),
                    amount: gain,
                });
            }
        }

        Ok((state, sell_gains))
    }
}

fn round_amount(value: Decimal) -> Decimal {
    value.round_dp(ROUNDING_SCALE)
}

/// Applies one transaction to the running state. Returns the realized
/// gain when the transaction is a sell. On error the state is unchanged.
pub(crate) fn apply_transaction(
    state: &mut PositionState,
    transaction: &Transaction,
) -> Result<Option<Decimal>> {
    let transaction_type =
        TransactionType::from_str(&transaction.transaction_type).map_err(|_| {
            CalculatorError::UnsupportedTransactionType(transaction.transaction_type.clone())
        })?;

    match transaction_type {
        TransactionType::Buy | TransactionType::DividendReinvestment => {
            handle_acquisition(state, transaction);
            Ok(None)
        }
        TransactionType::Sell => handle_sell(state, transaction).map(Some),
        TransactionType::Fee => {
            handle_fee(state, transaction);
            Ok(None)
        }
    }
}

fn handle_acquisition(state: &mut PositionState, transaction: &Transaction) {
    state.shares += transaction.shares;
    state.cost_basis += round_amount(transaction.shares * transaction.price_per_share);
    state.fees += transaction.fee_amount;
}

fn handle_sell(state: &mut PositionState, transaction: &Transaction) -> Result<Decimal> {
    if state.shares.is_zero() || transaction.shares > state.shares {
        return Err(CalculatorError::Oversell {
            requested: transaction.shares,
            available: state.shares,
            date: transaction.transaction_date,
        });
    }

    let average_cost = state.cost_basis / state.shares;
    let gain = round_amount(transaction.shares * (transaction.price_per_share - average_cost));
    let cost_removed = round_amount(transaction.shares * average_cost);

    state.realized_gain += gain;
    state.cost_basis -= cost_removed;
    state.shares -= transaction.shares;
    state.fees += transaction.fee_amount;

    // A fully liquidated position holds no cost; clear the rounding residue.
    if state.shares.is_zero() {
        state.cost_basis = Decimal::ZERO;
    }

    Ok(gain)
}

fn handle_fee(state: &mut PositionState, transaction: &Transaction) {
    state.fees += transaction.fee_amount;
}
