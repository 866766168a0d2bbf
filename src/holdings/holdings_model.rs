use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::holdings_errors::{HoldingError, Result};

/// Domain model representing one fund position within one portfolio
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub portfolio_id: String,
    pub fund_id: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new holding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub portfolio_id: String,
    pub fund_id: String,
    pub currency: String,
}

impl NewHolding {
    /// Validates the new holding data
    pub fn validate(&self) -> Result<()> {
        if self.portfolio_id.trim().is_empty() {
            return Err(HoldingError::InvalidData(
                "Portfolio ID cannot be empty".to_string(),
            ));
        }
        if self.fund_id.trim().is_empty() {
            return Err(HoldingError::InvalidData(
                "Fund ID cannot be empty".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(HoldingError::InvalidData(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for updating an existing holding (archival only; the
/// portfolio/fund pair is immutable once created)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingUpdate {
    pub id: String,
    pub is_active: bool,
}

/// Database model for holdings
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
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub portfolio_id: String,
    pub fund_id: String,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Conversion implementations
impl From<HoldingDB> for Holding {
    fn from(db: HoldingDB) -> Self {
        Self {
            id: db.id,
            portfolio_id: db.portfolio_id,
            fund_id: db.fund_id,
            currency: db.currency,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewHolding> for HoldingDB {
    fn from(domain: NewHolding) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            portfolio_id: domain.portfolio_id,
            fund_id: domain.fund_id,
            currency: domain.currency,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
