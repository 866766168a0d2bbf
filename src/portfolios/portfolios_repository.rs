use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::portfolios;
use crate::schema::portfolios::dsl::*;

use super::portfolios_errors::{PortfolioError, Result};
use super::portfolios_model::{NewPortfolio, Portfolio, PortfolioDB, PortfolioUpdate};
use super::portfolios_traits::PortfolioRepositoryTrait;

/// Repository for managing portfolio data in the database
pub struct PortfolioRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl PortfolioRepository {
    /// Creates a new PortfolioRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl PortfolioRepositoryTrait for PortfolioRepository {
    fn create(&self, new_portfolio: NewPortfolio) -> Result<Portfolio> {
        new_portfolio.validate()?;

        let mut portfolio_db: PortfolioDB = new_portfolio.into();
        if portfolio_db.id.is_empty() {
            portfolio_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| PortfolioError::DatabaseError(e.to_string()))?;

        diesel::insert_into(portfolios::table)
            .values(&portfolio_db)
            .execute(&mut conn)?;

        Ok(portfolio_db.into())
    }

    fn update(&self, portfolio_update: PortfolioUpdate) -> Result<Portfolio> {
        portfolio_update.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| PortfolioError::DatabaseError(e.to_string()))?;

        let mut existing = portfolios
            .find(&portfolio_update.id)
            .first::<PortfolioDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => PortfolioError::NotFound(format!(
                    "Portfolio with id {} not found",
                    portfolio_update.id
                )),
                _ => PortfolioError::DatabaseError(e.to_string()),
            })?;

        existing.name = portfolio_update.name;
        existing.is_default = portfolio_update.is_default;
        existing.is_active = portfolio_update.is_active;
        existing.updated_at = chrono::Utc::now().naive_utc();

        diesel::update(portfolios.find(&existing.id))
            .set(&existing)
            .execute(&mut conn)?;

        Ok(existing.into())
    }

    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| PortfolioError::DatabaseError(e.to_string()))?;

        let portfolio = portfolios
            .find(portfolio_id)
            .first::<PortfolioDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => PortfolioError::NotFound(format!(
                    "Portfolio with id {} not found",
                    portfolio_id
                )),
                _ => PortfolioError::DatabaseError(e.to_string()),
            })?;

        Ok(portfolio.into())
    }

    /// Lists portfolios, optionally filtering by active status
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Portfolio>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| PortfolioError::DatabaseError(e.to_string()))?;

        let mut query = portfolios::table.into_boxed();

        if let Some(active) = is_active_filter {
            query = query.filter(is_active.eq(active));
        }

        query
            .order((is_active.desc(), name.asc()))
            .load::<PortfolioDB>(&mut conn)
            .map_err(PortfolioError::from)
            .map(|results| results.into_iter().map(Portfolio::from).collect())
    }

    fn delete(&self, portfolio_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| PortfolioError::DatabaseError(e.to_string()))?;

        let affected = diesel::delete(portfolios.find(portfolio_id)).execute(&mut conn)?;

        if affected == 0 {
            return Err(PortfolioError::NotFound(format!(
                "Portfolio with id {} not found",
                portfolio_id
            )));
        }

        Ok(affected)
    }
}
