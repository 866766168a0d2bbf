use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::funds;
use crate::schema::funds::dsl::*;

use super::funds_errors::{FundError, Result};
use super::funds_model::{Fund, FundDB, NewFund};
use super::funds_traits::FundRepositoryTrait;

/// Repository for managing fund reference data in the database
pub struct FundRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl FundRepository {
    /// Creates a new FundRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl FundRepositoryTrait for FundRepository {
    fn get_by_id(&self, fund_id: &str) -> Result<Fund> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        let fund = funds
            .find(fund_id)
            .first::<FundDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    FundError::NotFound(format!("Fund with id {} not found", fund_id))
                }
                _ => FundError::DatabaseError(e.to_string()),
            })?;

        Ok(fund.into())
    }

    fn get_by_ids(&self, fund_ids: &[String]) -> Result<Vec<Fund>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        funds
            .filter(id.eq_any(fund_ids))
            .order(symbol.asc())
            .load::<FundDB>(&mut conn)
            .map_err(FundError::from)
            .map(|results| results.into_iter().map(Fund::from).collect())
    }

    fn find_by_isin_or_symbol(
        &self,
        isin_filter: Option<&str>,
        symbol_filter: &str,
    ) -> Result<Option<Fund>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        if let Some(isin_value) = isin_filter {
            if !isin_value.trim().is_empty() {
                let by_isin = funds
                    .filter(isin.eq(isin_value))
                    .first::<FundDB>(&mut conn)
                    .optional()?;
                if let Some(fund) = by_isin {
                    return Ok(Some(fund.into()));
                }
            }
        }

        let by_symbol = funds
            .filter(symbol.eq(symbol_filter))
            .first::<FundDB>(&mut conn)
            .optional()?;

        Ok(by_symbol.map(Fund::from))
    }

    fn create(&self, new_fund: NewFund) -> Result<Fund> {
        new_fund.validate()?;

        let mut fund_db: FundDB = new_fund.into();
        if fund_db.id.is_empty() {
            fund_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| FundError::DatabaseError(e.to_string()))?;

        diesel::insert_into(funds::table)
            .values(&fund_db)
            .execute(&mut conn)?;

        Ok(fund_db.into())
    }

    fn get_or_create(&self, new_fund: NewFund) -> Result<Fund> {
        if let Some(existing) =
            self.find_by_isin_or_symbol(new_fund.isin.as_deref(), &new_fund.symbol)?
        {
            return Ok(existing);
        }
        self.create(new_fund)
    }
}
