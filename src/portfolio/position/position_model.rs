use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_serde::decimal_serde;

/// Running accounting state of one holding while its ledger is replayed.
///
/// Never persisted. The state is a pure function of the holding's sorted
/// transaction list up to a date and is recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub holding_id: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    /// Total amount paid, net of sells, for the shares currently held.
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    /// Gain locked in by sells, cumulative over the whole ledger.
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    /// Fees accumulated for display; they never touch shares or cost basis.
    #[serde(with = "decimal_serde")]
    pub fees: Decimal,
}

impl PositionState {
    pub fn new(holding_id: &str) -> Self {
        PositionState {
            holding_id: holding_id.to_string(),
            shares: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            fees: Decimal::ZERO,
        }
    }

    /// Blended per-share cost of the current position, zero when empty.
    pub fn average_cost(&self) -> Decimal {
        if self.shares.is_zero() {
            Decimal::ZERO
        } else {
            self.cost_basis / self.shares
        }
    }
}
