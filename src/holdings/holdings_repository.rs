use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{dividends, holdings, realized_gains, transactions};

use super::holdings_errors::{HoldingError, Result};
use super::holdings_model::{Holding, HoldingDB, HoldingUpdate, NewHolding};
use super::holdings_traits::HoldingRepositoryTrait;

/// Repository for managing holding data in the database
pub struct HoldingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl HoldingRepository {
    /// Creates a new HoldingRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl HoldingRepositoryTrait for HoldingRepository {
    fn get_by_id(&self, holding_id: &str) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        let holding = holdings::table
            .find(holding_id)
            .first::<HoldingDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    HoldingError::NotFound(format!("Holding with id {} not found", holding_id))
                }
                _ => HoldingError::DatabaseError(e.to_string()),
            })?;

        Ok(holding.into())
    }

    fn get_by_ids(&self, holding_ids: &[String]) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .filter(holdings::id.eq_any(holding_ids))
            .order((holdings::portfolio_id.asc(), holdings::id.asc()))
            .load::<HoldingDB>(&mut conn)
            .map_err(HoldingError::from)
            .map(|results| results.into_iter().map(Holding::from).collect())
    }

    fn get_by_portfolio(&self, portfolio_id: &str) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        holdings::table
            .filter(holdings::portfolio_id.eq(portfolio_id))
            .order(holdings::id.asc())
            .load::<HoldingDB>(&mut conn)
            .map_err(HoldingError::from)
            .map(|results| results.into_iter().map(Holding::from).collect())
    }

    fn find_by_portfolio_and_fund(
        &self,
        portfolio_id: &str,
        fund_id: &str,
    ) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        let holding = holdings::table
            .filter(holdings::portfolio_id.eq(portfolio_id))
            .filter(holdings::fund_id.eq(fund_id))
            .first::<HoldingDB>(&mut conn)
            .optional()?;

        Ok(holding.map(Holding::from))
    }

    fn create(&self, new_holding: NewHolding) -> Result<Holding> {
        new_holding.validate()?;

        let mut holding_db: HoldingDB = new_holding.into();
        if holding_db.id.is_empty() {
            holding_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        diesel::insert_into(holdings::table)
            .values(&holding_db)
            .execute(&mut conn)?;

        Ok(holding_db.into())
    }

    fn update(&self, holding_update: HoldingUpdate) -> Result<Holding> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        let mut existing = holdings::table
            .find(&holding_update.id)
            .first::<HoldingDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => HoldingError::NotFound(format!(
                    "Holding with id {} not found",
                    holding_update.id
                )),
                _ => HoldingError::DatabaseError(e.to_string()),
            })?;

        existing.is_active = holding_update.is_active;
        existing.updated_at = chrono::Utc::now().naive_utc();

        diesel::update(holdings::table.find(&existing.id))
            .set(&existing)
            .execute(&mut conn)?;

        Ok(existing.into())
    }

    fn delete(&self, holding_id: &str, force: bool) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| HoldingError::DatabaseError(e.to_string()))?;

        let transaction_count: i64 = transactions::table
            .filter(transactions::holding_id.eq(holding_id))
            .count()
            .get_result(&mut conn)?;
        let dividend_count: i64 = dividends::table
            .filter(dividends::holding_id.eq(holding_id))
            .count()
            .get_result(&mut conn)?;

        if (transaction_count > 0 || dividend_count > 0) && !force {
            return Err(HoldingError::HasLedgerEntries(format!(
                "holding {} has {} transactions and {} dividends; deletion requires confirmation",
                holding_id, transaction_count, dividend_count
            )));
        }

        conn.transaction::<_, HoldingError, _>(|conn| {
            let transaction_ids: Vec<String> = transactions::table
                .filter(transactions::holding_id.eq(holding_id))
                .select(transactions::id)
                .load::<String>(conn)?;

            // Dividends reference their reinvestment transactions, so they
            // must go before the transaction rows do.
            diesel::delete(
                realized_gains::table
                    .filter(realized_gains::transaction_id.eq_any(&transaction_ids)),
            )
            .execute(conn)?;
            diesel::delete(dividends::table.filter(dividends::holding_id.eq(holding_id)))
                .execute(conn)?;
            diesel::delete(transactions::table.filter(transactions::holding_id.eq(holding_id)))
                .execute(conn)?;

            let affected =
                diesel::delete(holdings::table.find(holding_id)).execute(conn)?;
            if affected == 0 {
                return Err(HoldingError::NotFound(format!(
                    "Holding with id {} not found",
                    holding_id
                )));
            }

            debug!(
                "Deleted holding {} with {} transactions and {} dividends",
                holding_id, transaction_count, dividend_count
            );
            Ok(())
        })
    }
}
