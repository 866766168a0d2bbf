use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::decimal_serde::decimal_serde;

use super::transactions_constants::*;
use super::transactions_errors::{Result, TransactionError};

/// Domain model representing a ledger transaction on a holding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub holding_id: String,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub price_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee_amount: Decimal,
    pub currency: String,
    pub source_transaction_id: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for transactions
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
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TransactionDB {
    pub id: String,
    pub holding_id: String,
    pub transaction_date: NaiveDate,
    pub transaction_type: String,
    pub shares: String,
    pub price_per_share: String,
    pub fee_amount: String,
    pub currency: String,
    pub source_transaction_id: Option<String>,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub holding_id: String,
    pub transaction_date: String,
    pub transaction_type: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub price_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee_amount: Decimal,
    pub currency: String,
    pub source_transaction_id: Option<String>,
    pub note: Option<String>,
}

impl NewTransaction {
    /// Validates the new transaction data
    pub fn validate(&self) -> Result<()> {
        if self.holding_id.trim().is_empty() {
            return Err(TransactionError::InvalidData(
                "Holding ID cannot be empty".to_string(),
            ));
        }
        let transaction_type = TransactionType::from_str(&self.transaction_type)
            .map_err(TransactionError::InvalidData)?;
        if NaiveDate::parse_from_str(&self.transaction_date, "%Y-%m-%d").is_err() {
            return Err(TransactionError::InvalidData(
                "Invalid date format. Expected YYYY-MM-DD".to_string(),
            ));
        }
        if transaction_type != TransactionType::Fee
            && (self.shares.is_zero() || self.shares.is_sign_negative())
        {
            return Err(TransactionError::InvalidData(
                "Share count must be positive".to_string(),
            ));
        }
        if self.shares.is_sign_negative() {
            return Err(TransactionError::InvalidData(
                "Share count cannot be negative".to_string(),
            ));
        }
        if self.price_per_share.is_sign_negative() {
            return Err(TransactionError::InvalidData(
                "Price per share cannot be negative".to_string(),
            ));
        }
        if self.fee_amount.is_sign_negative() {
            return Err(TransactionError::InvalidData(
                "Fee amount cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for updating an existing transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub holding_id: String,
    pub transaction_date: String,
    pub transaction_type: String,
    #[serde(with = "decimal_serde")]
    pub shares: Decimal,
    #[serde(with = "decimal_serde")]
    pub price_per_share: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee_amount: Decimal,
    pub currency: String,
    pub note: Option<String>,
}

impl TransactionUpdate {
    /// Validates the transaction update data
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TransactionError::InvalidData(
                "Transaction ID is required for updates".to_string(),
            ));
        }
        let as_new = NewTransaction {
            id: Some(self.id.clone()),
            holding_id: self.holding_id.clone(),
            transaction_date: self.transaction_date.clone(),
            transaction_type: self.transaction_type.clone(),
            shares: self.shares,
            price_per_share: self.price_per_share,
            fee_amount: self.fee_amount,
            currency: self.currency.clone(),
            source_transaction_id: None,
            note: self.note.clone(),
        };
        as_new.validate()
    }
}

/// Gain locked in by a sell, computed against average cost at sale time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealizedGain {
    pub id: String,
    pub transaction_id: String,
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for realized gains
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
#[diesel(table_name = crate::schema::realized_gains)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RealizedGainDB {
    pub id: String,
    pub transaction_id: String,
    pub amount: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Desired realized-gain row for one sell; the repository diffs these
/// against what is stored and applies inserts/updates/deletes atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRealizedGain {
    pub transaction_id: String,
    pub amount: Decimal,
}

/// Enum representing the supported transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Buy,
    Sell,
    DividendReinvestment,
    Fee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
            TransactionType::DividendReinvestment => TRANSACTION_TYPE_DIVIDEND_REINVESTMENT,
            TransactionType::Fee => TRANSACTION_TYPE_FEE,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == TRANSACTION_TYPE_BUY => Ok(TransactionType::Buy),
            s if s == TRANSACTION_TYPE_SELL => Ok(TransactionType::Sell),
            s if s == TRANSACTION_TYPE_DIVIDEND_REINVESTMENT => {
                Ok(TransactionType::DividendReinvestment)
            }
            s if s == TRANSACTION_TYPE_FEE => Ok(TransactionType::Fee),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

// Conversion implementations
impl From<TransactionDB> for Transaction {
    fn from(db: TransactionDB) -> Self {
        Self {
            id: db.id,
            holding_id: db.holding_id,
            transaction_date: db.transaction_date,
            transaction_type: db.transaction_type,
            shares: Decimal::from_str(&db.shares).unwrap_or_default(),
            price_per_share: Decimal::from_str(&db.price_per_share).unwrap_or_default(),
            fee_amount: Decimal::from_str(&db.fee_amount).unwrap_or_default(),
            currency: db.currency,
            source_transaction_id: db.source_transaction_id,
            note: db.note,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&Transaction> for TransactionDB {
    fn from(domain: &Transaction) -> Self {
        Self {
            id: domain.id.clone(),
            holding_id: domain.holding_id.clone(),
            transaction_date: domain.transaction_date,
            transaction_type: domain.transaction_type.clone(),
            shares: domain.shares.to_string(),
            price_per_share: domain.price_per_share.to_string(),
            fee_amount: domain.fee_amount.to_string(),
            currency: domain.currency.clone(),
            source_transaction_id: domain.source_transaction_id.clone(),
            note: domain.note.clone(),
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }
}

impl From<NewTransaction> for TransactionDB {
    fn from(domain: NewTransaction) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let transaction_date = NaiveDate::parse_from_str(&domain.transaction_date, "%Y-%m-%d")
            .unwrap_or_else(|e| {
                log::error!(
                    "Failed to parse transaction date '{}': {}",
                    domain.transaction_date,
                    e
                );
                now.date()
            });

        Self {
            id: domain.id.unwrap_or_default(),
            holding_id: domain.holding_id,
            transaction_date,
            transaction_type: domain.transaction_type,
            shares: domain.shares.to_string(),
            price_per_share: domain.price_per_share.to_string(),
            fee_amount: domain.fee_amount.to_string(),
            currency: domain.currency,
            source_transaction_id: domain.source_transaction_id,
            note: domain.note,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<RealizedGainDB> for RealizedGain {
    fn from(db: RealizedGainDB) -> Self {
        Self {
            id: db.id,
            transaction_id: db.transaction_id,
            amount: Decimal::from_str(&db.amount).unwrap_or_default(),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
