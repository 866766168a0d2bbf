use crate::transactions::{NewRealizedGain, TransactionDB};

use super::allocations_errors::Result;
use super::allocations_model::*;

/// Trait defining the contract for allocation repository operations.
pub trait AllocationRepositoryTrait: Send + Sync {
    fn get_external_transaction(&self, external_id: &str) -> Result<ExternalTransaction>;
    fn get_external_transactions(
        &self,
        status_filter: Option<&str>,
    ) -> Result<Vec<ExternalTransaction>>;
    fn create_external_transaction(
        &self,
        new_external: NewExternalTransaction,
    ) -> Result<ExternalTransaction>;
    /// Inserts the derived rows and marks the source processed, atomically.
    fn apply_allocation(
        &self,
        external_id: &str,
        derived_rows: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()>;
    /// Deletes the existing derived rows and inserts the new set,
    /// atomically; the source stays processed.
    fn replace_allocation(
        &self,
        external_id: &str,
        derived_rows: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()>;
    /// Deletes the derived rows and reverts the source to pending.
    fn remove_allocation(
        &self,
        external_id: &str,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()>;
}

/// Trait defining the contract for allocation service operations.
#[async_trait::async_trait]
pub trait AllocationServiceTrait: Send + Sync {
    fn get_external_transaction(&self, external_id: &str) -> crate::Result<ExternalTransaction>;
    fn get_external_transactions(
        &self,
        status_filter: Option<&str>,
    ) -> crate::Result<Vec<ExternalTransaction>>;
    async fn ingest_external_transaction(
        &self,
        new_external: NewExternalTransaction,
    ) -> crate::Result<ExternalTransaction>;
    async fn allocate(
        &self,
        external_id: &str,
        allocations: &[AllocationInput],
    ) -> crate::Result<AllocationOutcome>;
    async fn modify_allocations(
        &self,
        external_id: &str,
        allocations: &[AllocationInput],
    ) -> crate::Result<AllocationOutcome>;
    async fn unallocate(&self, external_id: &str) -> crate::Result<()>;
    async fn bulk_allocate(
        &self,
        external_ids: &[String],
        allocations: &[AllocationInput],
    ) -> crate::Result<Vec<BulkAllocationItem>>;
}
