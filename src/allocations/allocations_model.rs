use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::transactions::{TRANSACTION_TYPE_BUY, TRANSACTION_TYPE_SELL};
use crate::utils::decimal_serde::decimal_serde;

use super::allocations_constants::*;
use super::allocations_errors::{AllocationError, Result};

/// Domain model for a transaction imported from an external broker.
/// It carries no holding of its own; allocation splits it into
/// holding-scoped transactions by percentage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTransaction {
    pub id: String,
    pub broker_ref: Option<String>,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub price_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for external transactions
#[derive(
    Queryable,
    Selectable,
    Identifiable,
    Insertable,
    AsChangeset,
    PartialEq,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::external_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ExternalTransactionDB {
    pub id: String,
    pub broker_ref: Option<String>,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    pub shares: String,
    pub price_per_share: String,
    pub fee_amount: String,
    pub currency: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for ingesting an external transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExternalTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub broker_ref: Option<String>,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub transaction_date: String,
    pub transaction_type: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub price_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee_amount: Decimal,
    pub currency: String,
}

impl NewExternalTransaction {
    /// Validates the new external transaction data
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(AllocationError::InvalidAllocation(
                "Symbol cannot be empty".to_string(),
            ));
        }
        if self.transaction_type != TRANSACTION_TYPE_BUY
            && self.transaction_type != TRANSACTION_TYPE_SELL
        {
            return Err(AllocationError::InvalidAllocation(format!(
                "Unsupported external transaction type: {}",
                self.transaction_type
            )));
        }
        if NaiveDate::parse_from_str(&self.transaction_date, "%Y-%m-%d").is_err() {
            return Err(AllocationError::InvalidAllocation(
                "Invalid date format. Expected YYYY-MM-DD".to_string(),
            ));
        }
        if self.shares.is_zero() || self.shares.is_sign_negative() {
            return Err(AllocationError::InvalidAllocation(
                "Share count must be positive".to_string(),
            ));
        }
        if self.price_per_share.is_sign_negative() {
            return Err(AllocationError::InvalidAllocation(
                "Price per share cannot be negative".to_string(),
            ));
        }
        if self.fee_amount.is_sign_negative() {
            return Err(AllocationError::InvalidAllocation(
                "Fee amount cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// One target of a split: a portfolio and the percentage it receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    pub portfolio_id: String,
    #[serde(with = "decimal_serde")]
    pub percent: Decimal,
}

/// Result of allocating one source transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    pub source_transaction_id: String,
    pub created_transaction_ids: Vec<String>,
}

/// Per-source result of a bulk allocation. A failed source reports its
/// error here without affecting the other sources in the batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkAllocationItem {
    pub source_transaction_id: String,
    pub created_transaction_ids: Vec<String>,
    pub error: Option<String>,
}

/// Validates an allocation set: non-empty, positive percentages, no
/// duplicate portfolios, and a total of 100 within a 0.01 tolerance.
pub(crate) fn validate_allocation_set(allocations: &[AllocationInput]) -> Result<()> {
    if allocations.is_empty() {
        return Err(AllocationError::InvalidAllocation(
            "At least one allocation is required".to_string(),
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut total = Decimal::ZERO;
    for allocation in allocations {
        if allocation.portfolio_id.trim().is_empty() {
            return Err(AllocationError::InvalidAllocation(
                "Portfolio ID cannot be empty".to_string(),
            ));
        }
        if !seen.insert(allocation.portfolio_id.as_str()) {
            return Err(AllocationError::InvalidAllocation(format!(
                "Portfolio {} appears more than once",
                allocation.portfolio_id
            )));
        }
        if allocation.percent.is_zero() || allocation.percent.is_sign_negative() {
            return Err(AllocationError::InvalidAllocation(format!(
                "Percentage for portfolio {} must be positive",
                allocation.portfolio_id
            )));
        }
        total += allocation.percent;
    }

    let tolerance = Decimal::new(1, 2);
    if (total - Decimal::ONE_HUNDRED).abs() > tolerance {
        return Err(AllocationError::InvalidPercentTotal(total));
    }

    Ok(())
}

/// Enum representing the external transaction lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalTransactionStatus {
    Pending,
    Processed,
}

impl ExternalTransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalTransactionStatus::Pending => EXTERNAL_TRANSACTION_STATUS_PENDING,
            ExternalTransactionStatus::Processed => EXTERNAL_TRANSACTION_STATUS_PROCESSED,
        }
    }
}

impl FromStr for ExternalTransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == EXTERNAL_TRANSACTION_STATUS_PENDING => Ok(ExternalTransactionStatus::Pending),
            s if s == EXTERNAL_TRANSACTION_STATUS_PROCESSED => {
                Ok(ExternalTransactionStatus::Processed)
            }
            _ => Err(format!("Unknown external transaction status: {}", s)),
        }
    }
}

// Conversion implementations
impl From<ExternalTransactionDB> for ExternalTransaction {
    fn from(db: ExternalTransactionDB) -> Self {
        Self {
            id: db.id,
            broker_ref: db.broker_ref,
            isin: db.isin,
            symbol: db.symbol,
            name: db.name,
            transaction_date: db.transaction_date,
            transaction_type: db.transaction_type,
            shares: Decimal::from_str(&db.shares).unwrap_or_default(),
            price_per_share: Decimal::from_str(&db.price_per_share).unwrap_or_default(),
            fee_amount: Decimal::from_str(&db.fee_amount).unwrap_or_default(),
            currency: db.currency,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewExternalTransaction> for ExternalTransactionDB {
    fn from(domain: NewExternalTransaction) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let transaction_date = NaiveDate::parse_from_str(&domain.transaction_date, "%Y-%m-%d")
            .unwrap_or_else(|e| {
                log::error!(
                    "Failed to parse external transaction date '{}': {}",
                    domain.transaction_date,
                    e
                );
                now.date()
            });

        Self {
            id: domain.id.unwrap_or_default(),
            broker_ref: domain.broker_ref,
            isin: domain.isin,
            symbol: domain.symbol,
            name: domain.name,
            transaction_date,
            transaction_type: domain.transaction_type,
            shares: domain.shares.to_string(),
            price_per_share: domain.price_per_share.to_string(),
            fee_amount: domain.fee_amount.to_string(),
            currency: domain.currency,
            status: EXTERNAL_TRANSACTION_STATUS_PENDING.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
