use chrono::NaiveDate;

use super::transactions_errors::Result;
use super::transactions_model::*;

/// Trait defining the contract for transaction repository operations.
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;
    fn get_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<Transaction>>;
    /// Bulk load for a set of holdings in one query, optionally bounded by
    /// an inclusive upper date.
    fn get_transactions_for_holdings(
        &self,
        holding_ids: &[String],
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>>;
    fn get_transactions_for_source(&self, source_transaction_id: &str)
        -> Result<Vec<Transaction>>;
    fn get_realized_gain_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<RealizedGain>>;
    /// Whether a dividend manages this transaction as its reinvestment.
    fn is_reinvestment_linked(&self, transaction_id: &str) -> Result<bool>;
    fn insert_transaction(
        &self,
        transaction: TransactionDB,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction>;
    fn insert_transactions(
        &self,
        transactions: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<usize>;
    fn update_transaction(
        &self,
        transaction: TransactionDB,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction>;
    fn delete_transaction(
        &self,
        transaction_id: &str,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction>;
}

/// Trait defining the contract for transaction service operations.
#[async_trait::async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> crate::Result<Transaction>;
    fn get_transactions_for_holding(&self, holding_id: &str) -> crate::Result<Vec<Transaction>>;
    fn get_realized_gain(&self, transaction_id: &str) -> crate::Result<Option<RealizedGain>>;
    async fn create_transaction(&self, new_transaction: NewTransaction)
        -> crate::Result<Transaction>;
    async fn update_transaction(
        &self,
        transaction_update: TransactionUpdate,
    ) -> crate::Result<Transaction>;
    async fn delete_transaction(&self, transaction_id: &str) -> crate::Result<Transaction>;
    async fn import_transactions(
        &self,
        new_transactions: Vec<NewTransaction>,
    ) -> crate::Result<usize>;
}
