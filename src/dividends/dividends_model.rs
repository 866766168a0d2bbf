use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::transactions::TransactionDB;
use crate::utils::decimal_serde::{decimal_serde, decimal_serde_option};

use super::dividends_constants::*;
use super::dividends_errors::{DividendError, Result};

/// Domain model representing a dividend on a holding.
///
/// `shares_owned` and `total_amount` are derived from the ledger as of
/// the record date; they are stored for display but recomputed on every
/// create and update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub id: String,
    pub holding_id: String,
    pub record_date: NaiveDate,
    pub ex_dividend_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub per_share_amount: Decimal,
    #[serde(with = "decimal_serde")]
    pub shares_owned: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_amount: Decimal,
    pub dividend_type: String,
    pub status: String,
    pub buy_order_date: Option<NaiveDate>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_shares: Option<Decimal>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_price: Option<Decimal>,
    pub reinvestment_transaction_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for dividends
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
#[diesel(table_name = crate::schema::dividends)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct DividendDB {
    pub id: String,
    pub holding_id: String,
    pub record_date: NaiveDate,
    pub ex_dividend_date: NaiveDate,
    pub per_share_amount: String,
    pub shares_owned: String,
    pub total_amount: String,
    pub dividend_type: String,
    pub status: String,
    pub buy_order_date: Option<NaiveDate>,
    pub reinvestment_shares: Option<String>,
    pub reinvestment_price: Option<String>,
    pub reinvestment_transaction_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new dividend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDividend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub holding_id: String,
    pub record_date: String,
    pub ex_dividend_date: String,
    #[serde(with = "decimal_serde")]
    pub per_share_amount: Decimal,
    pub dividend_type: String,
    pub buy_order_date: Option<String>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_shares: Option<Decimal>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_price: Option<Decimal>,
}

impl NewDividend {
    /// Validates the new dividend data
    pub fn validate(&self) -> Result<()> {
        if self.holding_id.trim().is_empty() {
            return Err(DividendError::InvalidData(
                "Holding ID cannot be empty".to_string(),
            ));
        }
        let kind = DividendKind::from_str(&self.dividend_type)
            .map_err(DividendError::InvalidData)?;
        if NaiveDate::parse_from_str(&self.record_date, "%Y-%m-%d").is_err() {
            return Err(DividendError::InvalidData(
                "Invalid record date format. Expected YYYY-MM-DD".to_string(),
            ));
        }
        if NaiveDate::parse_from_str(&self.ex_dividend_date, "%Y-%m-%d").is_err() {
            return Err(DividendError::InvalidData(
                "Invalid ex-dividend date format. Expected YYYY-MM-DD".to_string(),
            ));
        }
        if self.per_share_amount.is_sign_negative() {
            return Err(DividendError::InvalidData(
                "Per-share amount cannot be negative".to_string(),
            ));
        }

        validate_reinvestment_fields(
            kind,
            self.buy_order_date.as_deref(),
            self.reinvestment_shares,
            self.reinvestment_price,
        )
    }

    /// Whether all reinvestment fields are supplied
    pub fn has_reinvestment_fields(&self) -> bool {
        self.buy_order_date.is_some()
            && self.reinvestment_shares.is_some()
            && self.reinvestment_price.is_some()
    }
}

/// Input model for updating an existing dividend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendUpdate {
    pub id: String,
    pub holding_id: String,
    pub record_date: String,
    pub ex_dividend_date: String,
    #[serde(with = "decimal_serde")]
    pub per_share_amount: Decimal,
    pub dividend_type: String,
    pub buy_order_date: Option<String>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_shares: Option<Decimal>,
    #[serde(with = "decimal_serde_option")]
    pub reinvestment_price: Option<Decimal>,
}

impl DividendUpdate {
    /// Validates the dividend update data
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DividendError::InvalidData(
                "Dividend ID is required for updates".to_string(),
            ));
        }
        let as_new = NewDividend {
            id: Some(self.id.clone()),
            holding_id: self.holding_id.clone(),
            record_date: self.record_date.clone(),
            ex_dividend_date: self.ex_dividend_date.clone(),
            per_share_amount: self.per_share_amount,
            dividend_type: self.dividend_type.clone(),
            buy_order_date: self.buy_order_date.clone(),
            reinvestment_shares: self.reinvestment_shares,
            reinvestment_price: self.reinvestment_price,
        };
        as_new.validate()
    }

    /// Whether all reinvestment fields are supplied
    pub fn has_reinvestment_fields(&self) -> bool {
        self.buy_order_date.is_some()
            && self.reinvestment_shares.is_some()
            && self.reinvestment_price.is_some()
    }
}

fn validate_reinvestment_fields(
    kind: DividendKind,
    buy_order_date: Option<&str>,
    reinvestment_shares: Option<Decimal>,
    reinvestment_price: Option<Decimal>,
) -> Result<()> {
    let supplied = [
        buy_order_date.is_some(),
        reinvestment_shares.is_some(),
        reinvestment_price.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    match kind {
        DividendKind::Cash => {
            if supplied > 0 {
                return Err(DividendError::InvalidData(
                    "Cash dividends cannot carry reinvestment fields".to_string(),
                ));
            }
        }
        DividendKind::Stock => {
            if supplied != 0 && supplied != 3 {
                return Err(DividendError::InvalidData(
                    "Reinvestment requires buy order date, shares and price together".to_string(),
                ));
            }
            if let Some(date) = buy_order_date {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                    return Err(DividendError::InvalidData(
                        "Invalid buy order date format. Expected YYYY-MM-DD".to_string(),
                    ));
                }
            }
            if let Some(shares) = reinvestment_shares {
                if shares.is_zero() || shares.is_sign_negative() {
                    return Err(DividendError::InvalidData(
                        "Reinvestment shares must be positive".to_string(),
                    ));
                }
            }
            if let Some(price) = reinvestment_price {
                if price.is_sign_negative() {
                    return Err(DividendError::InvalidData(
                        "Reinvestment price cannot be negative".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Change to apply to a dividend's reinvestment transaction, computed by
/// the service and committed by the repository in one database
/// transaction together with the dividend row itself.
#[derive(Debug, Clone)]
pub enum ReinvestmentSync {
    /// No linked transaction change
    Keep,
    Create(TransactionDB),
    Update(TransactionDB),
    Delete(String),
}

/// Enum representing the supported dividend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DividendKind {
    Cash,
    Stock,
}

impl DividendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DividendKind::Cash => DIVIDEND_KIND_CASH,
            DividendKind::Stock => DIVIDEND_KIND_STOCK,
        }
    }
}

impl FromStr for DividendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == DIVIDEND_KIND_CASH => Ok(DividendKind::Cash),
            s if s == DIVIDEND_KIND_STOCK => Ok(DividendKind::Stock),
            _ => Err(format!("Unknown dividend kind: {}", s)),
        }
    }
}

/// Enum representing the dividend lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DividendStatus {
    Completed,
    Pending,
}

impl DividendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DividendStatus::Completed => DIVIDEND_STATUS_COMPLETED,
            DividendStatus::Pending => DIVIDEND_STATUS_PENDING,
        }
    }
}

impl FromStr for DividendStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            s if s == DIVIDEND_STATUS_COMPLETED => Ok(DividendStatus::Completed),
            s if s == DIVIDEND_STATUS_PENDING => Ok(DividendStatus::Pending),
            _ => Err(format!("Unknown dividend status: {}", s)),
        }
    }
}

// Conversion implementations
impl From<DividendDB> for Dividend {
    fn from(db: DividendDB) -> Self {
        Self {
            id: db.id,
            holding_id: db.holding_id,
            record_date: db.record_date,
            ex_dividend_date: db.ex_dividend_date,
            per_share_amount: Decimal::from_str(&db.per_share_amount).unwrap_or_default(),
            shares_owned: Decimal::from_str(&db.shares_owned).unwrap_or_default(),
            total_amount: Decimal::from_str(&db.total_amount).unwrap_or_default(),
            dividend_type: db.dividend_type,
            status: db.status,
            buy_order_date: db.buy_order_date,
            reinvestment_shares: db
                .reinvestment_shares
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            reinvestment_price: db
                .reinvestment_price
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            reinvestment_transaction_id: db.reinvestment_transaction_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
