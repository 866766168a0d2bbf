pub(crate) mod position_calculator;
pub(crate) mod position_model;

#[cfg(test)]
mod position_calculator_tests;

pub use position_calculator::{ledger_order, PositionCalculator, SellGain};
pub use position_model::PositionState;
