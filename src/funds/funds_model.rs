use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::funds_errors::{FundError, Result};

/// Domain model representing a fund (the instrument a holding tracks)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new fund
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFund {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub currency: String,
}

impl NewFund {
    /// Validates the new fund data
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(FundError::InvalidData(
                "Fund symbol cannot be empty".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(FundError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database model for funds
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::funds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FundDB {
    pub id: String,
    pub isin: Option<String>,
    pub symbol: String,
    pub name: Option<String>,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Conversion implementations
impl From<FundDB> for Fund {
    fn from(db: FundDB) -> Self {
        Self {
            id: db.id,
            isin: db.isin,
            symbol: db.symbol,
            name: db.name,
            currency: db.currency,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewFund> for FundDB {
    fn from(domain: NewFund) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            isin: domain.isin,
            symbol: domain.symbol,
            name: domain.name,
            currency: domain.currency,
            created_at: now,
            updated_at: now,
        }
    }
}
