use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::constants::ROUNDING_SCALE;
use crate::funds::{FundRepositoryTrait, NewFund};
use crate::holdings::{Holding, HoldingRepositoryTrait, NewHolding};
use crate::portfolio::position::PositionCalculator;
use crate::portfolios::PortfolioRepositoryTrait;
use crate::transactions::{
    NewRealizedGain, Transaction, TransactionDB, TransactionRepositoryTrait,
};
use crate::Result;

use super::allocations_constants::{
    EXTERNAL_TRANSACTION_STATUS_PENDING, EXTERNAL_TRANSACTION_STATUS_PROCESSED,
};
use super::allocations_errors::AllocationError;
use super::allocations_model::*;
use super::allocations_traits::{AllocationRepositoryTrait, AllocationServiceTrait};

/// Service for splitting externally imported transactions across
/// portfolios.
///
/// A pending source transaction is split into one holding-scoped
/// transaction per `(portfolio, percentage)` pair; the target holding is
/// resolved by fund ISIN first, symbol second, and created when missing.
/// The derived rows and the source status change commit atomically per
/// source. Bulk allocation treats each source independently.
pub struct AllocationService {
    allocation_repository: Arc<dyn AllocationRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    holding_repository: Arc<dyn HoldingRepositoryTrait>,
    fund_repository: Arc<dyn FundRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    calculator: PositionCalculator,
}

impl AllocationService {
    /// Creates a new AllocationService instance with injected dependencies
    pub fn new(
        allocation_repository: Arc<dyn AllocationRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        holding_repository: Arc<dyn HoldingRepositoryTrait>,
        fund_repository: Arc<dyn FundRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    ) -> Self {
        Self {
            allocation_repository,
            transaction_repository,
            holding_repository,
            fund_repository,
            portfolio_repository,
            calculator: PositionCalculator::new(),
        }
    }

    /// Resolves the holding a portfolio uses for the source's fund,
    /// creating the fund and holding as needed.
    fn resolve_holding(
        &self,
        portfolio_id: &str,
        source: &ExternalTransaction,
    ) -> Result<Holding> {
        self.portfolio_repository.get_by_id(portfolio_id)?;

        let fund = self.fund_repository.get_or_create(NewFund {
            id: None,
            isin: source.isin.clone(),
            symbol: source.symbol.clone(),
            name: source.name.clone(),
            currency: source.currency.clone(),
        })?;

        if let Some(existing) = self
            .holding_repository
            .find_by_portfolio_and_fund(portfolio_id, &fund.id)?
        {
            return Ok(existing);
        }

        debug!(
            "Creating holding for fund {} in portfolio {}",
            fund.id, portfolio_id
        );
        Ok(self.holding_repository.create(NewHolding {
            id: None,
            portfolio_id: portfolio_id.to_string(),
            fund_id: fund.id,
            currency: source.currency.clone(),
        })?)
    }

    /// Builds the derived rows for one source, in allocation order.
    fn build_derived_rows(
        &self,
        source: &ExternalTransaction,
        allocations: &[AllocationInput],
    ) -> Result<Vec<TransactionDB>> {
        let now = chrono::Utc::now().naive_utc();
        let mut rows = Vec::with_capacity(allocations.len());

        for allocation in allocations {
            let holding = self.resolve_holding(&allocation.portfolio_id, source)?;
            let fraction = allocation.percent / Decimal::ONE_HUNDRED;
            let shares = (source.shares * fraction).round_dp(ROUNDING_SCALE);
            let fee_amount = (source.fee_amount * fraction).round_dp(ROUNDING_SCALE);

            rows.push(TransactionDB {
                id: uuid::Uuid::new_v4().to_string(),
                holding_id: holding.id,
                transaction_date: source.transaction_date,
                transaction_type: source.transaction_type.clone(),
                shares: shares.to_string(),
                price_per_share: source.price_per_share.to_string(),
                fee_amount: fee_amount.to_string(),
                currency: source.currency.clone(),
                source_transaction_id: Some(source.id.clone()),
                note: None,
                created_at: now,
                updated_at: now,
            });
        }

        Ok(rows)
    }

    /// Computes the realized-gain end state of every holding the change
    /// touches: its current ledger minus the rows being removed, plus the
    /// new derived rows. Fails when any holding would oversell.
    fn build_gain_plans(
        &self,
        derived_rows: &[TransactionDB],
        removed: &[Transaction],
    ) -> Result<Vec<(String, Vec<NewRealizedGain>)>> {
        let removed_ids: Vec<&str> = removed.iter().map(|t| t.id.as_str()).collect();

        let mut additions: HashMap<String, Vec<Transaction>> = HashMap::new();
        for row in derived_rows {
            additions
                .entry(row.holding_id.clone())
                .or_default()
                .push(Transaction::from(row.clone()));
        }

        let affected: BTreeSet<String> = additions
            .keys()
            .cloned()
            .chain(removed.iter().map(|t| t.holding_id.clone()))
            .collect();

        let mut plans = Vec::with_capacity(affected.len());
        for holding_id in affected {
            let mut ledger: Vec<Transaction> = self
                .transaction_repository
                .get_transactions_for_holding(&holding_id)?
                .into_iter()
                .filter(|t| !removed_ids.contains(&t.id.as_str()))
                .collect();
            ledger.extend(additions.remove(&holding_id).unwrap_or_default());

            let (_, sell_gains) =
                self.calculator
                    .replay_with_sell_gains(&holding_id, &ledger, None)?;
            plans.push((
                holding_id,
                sell_gains
                    .into_iter()
                    .map(|gain| NewRealizedGain {
                        transaction_id: gain.transaction_id,
                        amount: gain.amount,
                    })
                    .collect(),
            ));
        }

        Ok(plans)
    }

    fn allocate_source(
        &self,
        external_id: &str,
        allocations: &[AllocationInput],
    ) -> Result<AllocationOutcome> {
        validate_allocation_set(allocations)?;

        let source = self
            .allocation_repository
            .get_external_transaction(external_id)?;
        if source.status != EXTERNAL_TRANSACTION_STATUS_PENDING {
            return Err(AllocationError::SourceNotPending(external_id.to_string()).into());
        }

        let derived_rows = self.build_derived_rows(&source, allocations)?;
        let gain_plans = self.build_gain_plans(&derived_rows, &[])?;
        let created_transaction_ids: Vec<String> =
            derived_rows.iter().map(|row| row.id.clone()).collect();

        self.allocation_repository
            .apply_allocation(external_id, derived_rows, &gain_plans)?;

        Ok(AllocationOutcome {
            source_transaction_id: external_id.to_string(),
            created_transaction_ids,
        })
    }
}

#[async_trait::async_trait]
impl AllocationServiceTrait for AllocationService {
    fn get_external_transaction(&self, external_id: &str) -> Result<ExternalTransaction> {
        Ok(self
            .allocation_repository
            .get_external_transaction(external_id)?)
    }

    fn get_external_transactions(
        &self,
        status_filter: Option<&str>,
    ) -> Result<Vec<ExternalTransaction>> {
        Ok(self
            .allocation_repository
            .get_external_transactions(status_filter)?)
    }

    async fn ingest_external_transaction(
        &self,
        new_external: NewExternalTransaction,
    ) -> Result<ExternalTransaction> {
        Ok(self
            .allocation_repository
            .create_external_transaction(new_external)?)
    }

    async fn allocate(
        &self,
        external_id: &str,
        allocations: &[AllocationInput],
    ) -> Result<AllocationOutcome> {
        self.allocate_source(external_id, allocations)
    }

    async fn modify_allocations(
        &self,
        external_id: &str,
        allocations: &[AllocationInput],
    ) -> Result<AllocationOutcome> {
        validate_allocation_set(allocations)?;

        let source = self
            .allocation_repository
            .get_external_transaction(external_id)?;
        if source.status != EXTERNAL_TRANSACTION_STATUS_PROCESSED {
            return Err(AllocationError::SourceNotProcessed(external_id.to_string()).into());
        }

        let existing_derived = self
            .transaction_repository
            .get_transactions_for_source(external_id)?;

        let derived_rows = self.build_derived_rows(&source, allocations)?;
        let gain_plans = self.build_gain_plans(&derived_rows, &existing_derived)?;
        let created_transaction_ids: Vec<String> =
            derived_rows.iter().map(|row| row.id.clone()).collect();

        self.allocation_repository
            .replace_allocation(external_id, derived_rows, &gain_plans)?;

        Ok(AllocationOutcome {
            source_transaction_id: external_id.to_string(),
            created_transaction_ids,
        })
    }

    async fn unallocate(&self, external_id: &str) -> Result<()> {
        let source = self
            .allocation_repository
            .get_external_transaction(external_id)?;
        if source.status != EXTERNAL_TRANSACTION_STATUS_PROCESSED {
            return Err(AllocationError::SourceNotProcessed(external_id.to_string()).into());
        }

        let existing_derived = self
            .transaction_repository
            .get_transactions_for_source(external_id)?;
        let gain_plans = self.build_gain_plans(&[], &existing_derived)?;

        Ok(self
            .allocation_repository
            .remove_allocation(external_id, &gain_plans)?)
    }

    async fn bulk_allocate(
        &self,
        external_ids: &[String],
        allocations: &[AllocationInput],
    ) -> Result<Vec<BulkAllocationItem>> {
        let mut items = Vec::with_capacity(external_ids.len());

        for external_id in external_ids {
            match self.allocate_source(external_id, allocations) {
                Ok(outcome) => items.push(BulkAllocationItem {
                    source_transaction_id: outcome.source_transaction_id,
                    created_transaction_ids: outcome.created_transaction_ids,
                    error: None,
                }),
                Err(e) => {
                    warn!("Bulk allocation failed for source {}: {}", external_id, e);
                    items.push(BulkAllocationItem {
                        source_transaction_id: external_id.clone(),
                        created_transaction_ids: Vec::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(items)
    }
}
