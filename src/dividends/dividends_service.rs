use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::ROUNDING_SCALE;
use crate::holdings::{Holding, HoldingRepositoryTrait};
use crate::portfolio::position::PositionCalculator;
use crate::transactions::{
    NewRealizedGain, Transaction, TransactionDB, TransactionRepositoryTrait,
    TRANSACTION_TYPE_DIVIDEND_REINVESTMENT,
};
use crate::Result;

use super::dividends_errors::DividendError;
use super::dividends_model::*;
use super::dividends_traits::{DividendRepositoryTrait, DividendServiceTrait};

/// Service for managing the dividend lifecycle.
///
/// Cash dividends complete on entry. Stock dividends stay pending until
/// their reinvestment fields arrive, at which point a reinvestment
/// transaction is created and kept in sync with the dividend: editing the
/// dividend edits the transaction, deleting it deletes the transaction,
/// always in one database transaction.
pub struct DividendService {
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    calculator: PositionCalculator,
}

impl DividendService {
    /// Creates a new DividendService instance with injected dependencies
    pub fn new(
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ) -> Self {
        Self {
            dividend_repository,
            transaction_repository,
            holding_repository,
            calculator: PositionCalculator::new(),
        }
    }

    fn build_gain_plan(
        &self,
        holding_id: &str,
        ledger: &[Transaction],
    ) -> Result<Vec<NewRealizedGain>> {
        let (_, sell_gains) = self
            .calculator
            .replay_with_sell_gains(holding_id, ledger, None)?;
        Ok(sell_gains
            .into_iter()
            .map(|gain| NewRealizedGain {
                transaction_id: gain.transaction_id,
                amount: gain.amount,
            })
            .collect())
    }

    fn build_reinvestment_row(
        &self,
        holding: &Holding,
        buy_order_date: NaiveDate,
        shares: Decimal,
        price: Decimal,
    ) -> TransactionDB {
        let now = chrono::Utc::now().naive_utc();
        TransactionDB {
            id: uuid::Uuid::new_v4().to_string(),
            holding_id: holding.id.clone(),
            transaction_date: buy_order_date,
            transaction_type: TRANSACTION_TYPE_DIVIDEND_REINVESTMENT.to_string(),
            shares: shares.to_string(),
            price_per_share: price.to_string(),
            fee_amount: Decimal::ZERO.to_string(),
            currency: holding.currency.clone(),
            source_transaction_id: None,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn parse_date(value: &str, label: &str) -> std::result::Result<NaiveDate, DividendError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DividendError::InvalidData(format!("Invalid {}: {}", label, value)))
}

#[async_trait::async_trait]
impl DividendServiceTrait for DividendService {
    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        Ok(self.dividend_repository.get_dividend(dividend_id)?)
    }

    fn get_dividends_for_holding(&self, holding_id: &str) -> Result<Vec<Dividend>> {
        Ok(self
            .dividend_repository
            .get_dividends_for_holding(holding_id)?)
    }

    fn shares_owned_at(&self, holding_id: &str, date: NaiveDate) -> Result<Decimal> {
        let ledger = self
            .transaction_repository
            .get_transactions_for_holding(holding_id)?;
        let state = self.calculator.replay(holding_id, &ledger, Some(date))?;
        Ok(state.shares)
    }

    async fn create_dividend(&self, new_dividend: NewDividend) -> Result<Dividend> {
        new_dividend.validate()?;

        let holding = self
            .holding_repository
            .get_by_id(&new_dividend.holding_id)?;
        let kind = DividendKind::from_str(&new_dividend.dividend_type)
            .map_err(DividendError::InvalidData)?;
        let record_date = parse_date(&new_dividend.record_date, "record date")?;
        let ex_dividend_date = parse_date(&new_dividend.ex_dividend_date, "ex-dividend date")?;
        let buy_order_date = new_dividend
            .buy_order_date
            .as_deref()
            .map(|value| parse_date(value, "buy order date"))
            .transpose()?;

        let ledger = self
            .transaction_repository
            .get_transactions_for_holding(&holding.id)?;

        let now = chrono::Utc::now().naive_utc();
        let mut dividend_db = DividendDB {
            id: new_dividend
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            holding_id: holding.id.clone(),
            record_date,
            ex_dividend_date,
            per_share_amount: new_dividend.per_share_amount.to_string(),
            shares_owned: String::new(),
            total_amount: String::new(),
            dividend_type: kind.as_str().to_string(),
            status: DividendStatus::Pending.as_str().to_string(),
            buy_order_date,
            reinvestment_shares: new_dividend.reinvestment_shares.map(|d| d.to_string()),
            reinvestment_price: new_dividend.reinvestment_price.map(|d| d.to_string()),
            reinvestment_transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut sync = ReinvestmentSync::Keep;
        let mut prospective_ledger = ledger;

        match kind {
            DividendKind::Cash => {
                dividend_db.status = DividendStatus::Completed.as_str().to_string();
            }
            DividendKind::Stock if new_dividend.has_reinvestment_fields() => {
                let row = self.build_reinvestment_row(
                    &holding,
                    buy_order_date.unwrap_or(record_date),
                    new_dividend.reinvestment_shares.unwrap_or_default(),
                    new_dividend.reinvestment_price.unwrap_or_default(),
                );
                dividend_db.reinvestment_transaction_id = Some(row.id.clone());
                dividend_db.status = DividendStatus::Completed.as_str().to_string();
                prospective_ledger.push(Transaction::from(row.clone()));
                sync = ReinvestmentSync::Create(row);
            }
            DividendKind::Stock => {
                // Pending until the buy order details arrive, however far
                // past the ex-dividend date we are.
            }
        }

        let state = self
            .calculator
            .replay(&holding.id, &prospective_ledger, Some(record_date))?;
        let total_amount =
            (state.shares * new_dividend.per_share_amount).round_dp(ROUNDING_SCALE);
        dividend_db.shares_owned = state.shares.to_string();
        dividend_db.total_amount = total_amount.to_string();

        let gain_plan = self.build_gain_plan(&holding.id, &prospective_ledger)?;

        debug!(
            "Creating {} dividend for holding {} with record date {} ({} shares, total {})",
            dividend_db.dividend_type, holding.id, record_date, state.shares, total_amount
        );

        Ok(self
            .dividend_repository
            .insert_dividend(dividend_db, sync, &gain_plan)?)
    }

    async fn update_dividend(&self, dividend_update: DividendUpdate) -> Result<Dividend> {
        dividend_update.validate()?;

        let existing = self.dividend_repository.get_dividend(&dividend_update.id)?;
        if existing.holding_id != dividend_update.holding_id {
            return Err(DividendError::InvalidData(
                "A dividend cannot be moved to another holding".to_string(),
            )
            .into());
        }

        let holding = self.holding_repository.get_by_id(&existing.holding_id)?;
        let kind = DividendKind::from_str(&dividend_update.dividend_type)
            .map_err(DividendError::InvalidData)?;
        let record_date = parse_date(&dividend_update.record_date, "record date")?;
        let ex_dividend_date = parse_date(&dividend_update.ex_dividend_date, "ex-dividend date")?;
        let buy_order_date = dividend_update
            .buy_order_date
            .as_deref()
            .map(|value| parse_date(value, "buy order date"))
            .transpose()?;

        // The ledger as it stands, without the currently linked
        // reinvestment row; the desired row is re-added below.
        let base_ledger: Vec<Transaction> = self
            .transaction_repository
            .get_transactions_for_holding(&holding.id)?
            .into_iter()
            .filter(|t| {
                existing
                    .reinvestment_transaction_id
                    .as_deref()
                    .map_or(true, |linked| t.id != linked)
            })
            .collect();

        let now = chrono::Utc::now().naive_utc();
        let mut dividend_db = DividendDB {
            id: existing.id.clone(),
            holding_id: holding.id.clone(),
            record_date,
            ex_dividend_date,
            per_share_amount: dividend_update.per_share_amount.to_string(),
            shares_owned: String::new(),
            total_amount: String::new(),
            dividend_type: kind.as_str().to_string(),
            status: DividendStatus::Pending.as_str().to_string(),
            buy_order_date,
            reinvestment_shares: dividend_update.reinvestment_shares.map(|d| d.to_string()),
            reinvestment_price: dividend_update.reinvestment_price.map(|d| d.to_string()),
            reinvestment_transaction_id: None,
            created_at: existing.created_at,
            updated_at: now,
        };

        let mut prospective_ledger = base_ledger;
        let sync = match kind {
            DividendKind::Cash => {
                dividend_db.status = DividendStatus::Completed.as_str().to_string();
                match &existing.reinvestment_transaction_id {
                    Some(linked) => ReinvestmentSync::Delete(linked.clone()),
                    None => ReinvestmentSync::Keep,
                }
            }
            DividendKind::Stock if dividend_update.has_reinvestment_fields() => {
                dividend_db.status = DividendStatus::Completed.as_str().to_string();
                let order_date = buy_order_date.unwrap_or(record_date);
                let shares = dividend_update.reinvestment_shares.unwrap_or_default();
                let price = dividend_update.reinvestment_price.unwrap_or_default();

                match &existing.reinvestment_transaction_id {
                    Some(linked) => {
                        let current = self.transaction_repository.get_transaction(linked)?;
                        let mut row = TransactionDB::from(&current);
                        row.transaction_date = order_date;
                        row.shares = shares.to_string();
                        row.price_per_share = price.to_string();
                        row.updated_at = now;
                        dividend_db.reinvestment_transaction_id = Some(linked.clone());
                        prospective_ledger.push(Transaction::from(row.clone()));
                        ReinvestmentSync::Update(row)
                    }
                    None => {
                        let row =
                            self.build_reinvestment_row(&holding, order_date, shares, price);
                        dividend_db.reinvestment_transaction_id = Some(row.id.clone());
                        prospective_ledger.push(Transaction::from(row.clone()));
                        ReinvestmentSync::Create(row)
                    }
                }
            }
            DividendKind::Stock => match &existing.reinvestment_transaction_id {
                Some(linked) => ReinvestmentSync::Delete(linked.clone()),
                None => ReinvestmentSync::Keep,
            },
        };

        let state = self
            .calculator
            .replay(&holding.id, &prospective_ledger, Some(record_date))?;
        let total_amount =
            (state.shares * dividend_update.per_share_amount).round_dp(ROUNDING_SCALE);
        dividend_db.shares_owned = state.shares.to_string();
        dividend_db.total_amount = total_amount.to_string();

        let gain_plan = self.build_gain_plan(&holding.id, &prospective_ledger)?;

        Ok(self
            .dividend_repository
            .update_dividend(dividend_db, sync, &gain_plan)?)
    }

    async fn delete_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        let existing = self.dividend_repository.get_dividend(dividend_id)?;

        let remaining_ledger: Vec<Transaction> = self
            .transaction_repository
            .get_transactions_for_holding(&existing.holding_id)?
            .into_iter()
            .filter(|t| {
                existing
                    .reinvestment_transaction_id
                    .as_deref()
                    .map_or(true, |linked| t.id != linked)
            })
            .collect();

        let gain_plan = self.build_gain_plan(&existing.holding_id, &remaining_ledger)?;

        Ok(self
            .dividend_repository
            .delete_dividend(dividend_id, &gain_plan)?)
    }
}
