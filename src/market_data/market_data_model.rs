use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::decimal_serde::decimal_serde;

use super::market_data_errors::{MarketDataError, Result};

/// Domain model for one closing price of a fund on a date.
/// The series is sparse; dates without a stored price forward-fill from
/// the most recent earlier one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub id: String,
    pub fund_id: String,
    pub price_date: NaiveDate,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for price points
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
#[diesel(table_name = crate::schema::price_points)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PricePointDB {
    pub id: String,
    pub fund_id: String,
    pub price_date: NaiveDate,
    pub price: String,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for recording or overwriting a price point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPricePoint {
    pub fund_id: String,
    pub price_date: String,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    pub currency: String,
}

impl NewPricePoint {
    /// Validates the new price point data
    pub fn validate(&self) -> Result<()> {
        if self.fund_id.trim().is_empty() {
            return Err(MarketDataError::InvalidData(
                "Fund ID cannot be empty".to_string(),
            ));
        }
        if NaiveDate::parse_from_str(&self.price_date, "%Y-%m-%d").is_err() {
            return Err(MarketDataError::InvalidData(
                "Invalid date format. Expected YYYY-MM-DD".to_string(),
            ));
        }
        if self.price.is_sign_negative() {
            return Err(MarketDataError::InvalidData(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

// Conversion implementations
impl From<PricePointDB> for PricePoint {
    fn from(db: PricePointDB) -> Self {
        Self {
            id: db.id,
            fund_id: db.fund_id,
            price_date: db.price_date,
            price: Decimal::from_str(&db.price).unwrap_or_default(),
            currency: db.currency,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
