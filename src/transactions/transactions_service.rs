use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::holdings::HoldingRepositoryTrait;
use crate::portfolio::position::PositionCalculator;
use crate::Result;

use super::transactions_errors::TransactionError;
use super::transactions_model::*;
use super::transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};

/// Service for managing ledger transactions.
///
/// Every mutation replays the affected holding's prospective ledger before
/// anything is written: an oversell anywhere in the result rejects the
/// write, and the realized-gain rows of the holding's sells are
/// reconciled in the same database transaction as the row change.
pub struct TransactionService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    calculator: PositionCalculator,
}

impl TransactionService {
    /// Creates a new TransactionService instance with injected dependencies
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            holding_repository,
            calculator: PositionCalculator::new(),
        }
    }

    /// Replays a prospective ledger and returns the realized-gain rows its
    /// sells should carry. Fails when the ledger would oversell.
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

    fn ensure_not_reinvestment_managed(&self, transaction_id: &str) -> Result<()> {
        if self
            .transaction_repository
            .is_reinvestment_linked(transaction_id)?
        {
            return Err(TransactionError::InvalidData(format!(
                "Transaction {} is managed by its dividend and cannot be changed directly",
                transaction_id
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TransactionServiceTrait for TransactionService {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        Ok(self.transaction_repository.get_transaction(transaction_id)?)
    }

    fn get_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .transaction_repository
            .get_transactions_for_holding(holding_id)?)
    }

    fn get_realized_gain(&self, transaction_id: &str) -> Result<Option<RealizedGain>> {
        Ok(self
            .transaction_repository
            .get_realized_gain_for_transaction(transaction_id)?)
    }

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        new_transaction.validate()?;

        let holding = self
            .holding_repository
            .get_by_id(&new_transaction.holding_id)?;

        let mut transaction_db: TransactionDB = new_transaction.into();
        if transaction_db.id.is_empty() {
            transaction_db.id = uuid::Uuid::new_v4().to_string();
        }
        if transaction_db.currency.is_empty() {
            transaction_db.currency = holding.currency.clone();
        }

        let mut ledger = self
            .transaction_repository
            .get_transactions_for_holding(&holding.id)?;
        ledger.push(Transaction::from(transaction_db.clone()));

        let gain_plan = self.build_gain_plan(&holding.id, &ledger)?;

        debug!(
            "Creating {} transaction for holding {} on {}",
            transaction_db.transaction_type, holding.id, transaction_db.transaction_date
        );

        Ok(self
            .transaction_repository
            .insert_transaction(transaction_db, &gain_plan)?)
    }

    async fn update_transaction(
        &self,
        transaction_update: TransactionUpdate,
    ) -> Result<Transaction> {
        transaction_update.validate()?;
        self.ensure_not_reinvestment_managed(&transaction_update.id)?;

        let existing = self
            .transaction_repository
            .get_transaction(&transaction_update.id)?;
        if existing.holding_id != transaction_update.holding_id {
            return Err(TransactionError::InvalidData(
                "A transaction cannot be moved to another holding".to_string(),
            )
            .into());
        }

        let mut transaction_db = TransactionDB::from(&existing);
        transaction_db.transaction_date =
            chrono::NaiveDate::parse_from_str(&transaction_update.transaction_date, "%Y-%m-%d")
                .map_err(|_| {
                    TransactionError::InvalidData(
                        "Invalid date format. Expected YYYY-MM-DD".to_string(),
                    )
                })?;
        transaction_db.transaction_type = transaction_update.transaction_type;
        transaction_db.shares = transaction_update.shares.to_string();
        transaction_db.price_per_share = transaction_update.price_per_share.to_string();
        transaction_db.fee_amount = transaction_update.fee_amount.to_string();
        transaction_db.currency = transaction_update.currency;
        transaction_db.note = transaction_update.note;
        transaction_db.updated_at = chrono::Utc::now().naive_utc();

        let mut ledger: Vec<Transaction> = self
            .transaction_repository
            .get_transactions_for_holding(&existing.holding_id)?
            .into_iter()
            .filter(|t| t.id != existing.id)
            .collect();
        ledger.push(Transaction::from(transaction_db.clone()));

        let gain_plan = self.build_gain_plan(&existing.holding_id, &ledger)?;

        Ok(self
            .transaction_repository
            .update_transaction(transaction_db, &gain_plan)?)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.ensure_not_reinvestment_managed(transaction_id)?;

        let existing = self.transaction_repository.get_transaction(transaction_id)?;

        let ledger: Vec<Transaction> = self
            .transaction_repository
            .get_transactions_for_holding(&existing.holding_id)?
            .into_iter()
            .filter(|t| t.id != existing.id)
            .collect();

        let gain_plan = self.build_gain_plan(&existing.holding_id, &ledger)?;

        Ok(self
            .transaction_repository
            .delete_transaction(transaction_id, &gain_plan)?)
    }

    async fn import_transactions(&self, new_transactions: Vec<NewTransaction>) -> Result<usize> {
        if new_transactions.is_empty() {
            return Ok(0);
        }

        let mut rows: Vec<TransactionDB> = Vec::with_capacity(new_transactions.len());
        for new_transaction in new_transactions {
            new_transaction.validate()?;

            let holding = self
                .holding_repository
                .get_by_id(&new_transaction.holding_id)?;

            let mut transaction_db: TransactionDB = new_transaction.into();
            if transaction_db.id.is_empty() {
                transaction_db.id = uuid::Uuid::new_v4().to_string();
            }
            if transaction_db.currency.is_empty() {
                transaction_db.currency = holding.currency;
            }
            rows.push(transaction_db);
        }

        let mut by_holding: HashMap<String, Vec<Transaction>> = HashMap::new();
        for row in &rows {
            by_holding
                .entry(row.holding_id.clone())
                .or_default()
                .push(Transaction::from(row.clone()));
        }

        let mut gain_plans = Vec::with_capacity(by_holding.len());
        for (holding_id, candidates) in by_holding {
            let mut ledger = self
                .transaction_repository
                .get_transactions_for_holding(&holding_id)?;
            ledger.extend(candidates);
            let plan = self.build_gain_plan(&holding_id, &ledger)?;
            gain_plans.push((holding_id, plan));
        }

        debug!("Importing {} transactions", rows.len());
        Ok(self
            .transaction_repository
            .insert_transactions(rows, &gain_plans)?)
    }
}
