use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{dividends, transactions};
use crate::transactions::transactions_repository::sync_realized_gains;
use crate::transactions::NewRealizedGain;

use super::dividends_errors::{DividendError, Result};
use super::dividends_model::*;
use super::dividends_traits::DividendRepositoryTrait;

/// Repository for managing dividend data in the database
pub struct DividendRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl DividendRepository {
    /// Creates a new DividendRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

fn update_dividend_row(
    conn: &mut SqliteConnection,
    dividend: &DividendDB,
) -> std::result::Result<(), DividendError> {
    let affected = diesel::update(dividends::table.find(&dividend.id))
        .set(dividend)
        .execute(conn)?;
    if affected == 0 {
        return Err(DividendError::NotFound(format!(
            "Dividend with id {} not found",
            dividend.id
        )));
    }
    Ok(())
}

/// Applies the reinvestment-transaction change computed by the service.
/// Must run inside the caller's database transaction.
fn apply_reinvestment_sync(
    conn: &mut SqliteConnection,
    sync: &ReinvestmentSync,
) -> std::result::Result<(), diesel::result::Error> {
    match sync {
        ReinvestmentSync::Keep => {}
        ReinvestmentSync::Create(row) => {
            diesel::insert_into(transactions::table)
                .values(row)
                .execute(conn)?;
        }
        ReinvestmentSync::Update(row) => {
            diesel::update(transactions::table.find(&row.id))
                .set(row)
                .execute(conn)?;
        }
        ReinvestmentSync::Delete(transaction_id) => {
            diesel::delete(transactions::table.find(transaction_id)).execute(conn)?;
        }
    }
    Ok(())
}

impl DividendRepositoryTrait for DividendRepository {
    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        let dividend = dividends::table
            .find(dividend_id)
            .first::<DividendDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    DividendError::NotFound(format!("Dividend with id {} not found", dividend_id))
                }
                _ => DividendError::DatabaseError(e.to_string()),
            })?;

        Ok(dividend.into())
    }

    fn get_dividends_for_holding(&self, holding_id: &str) -> Result<Vec<Dividend>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividends::table
            .filter(dividends::holding_id.eq(holding_id))
            .order((dividends::record_date.asc(), dividends::id.asc()))
            .load::<DividendDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Dividend::from).collect())
            .map_err(DividendError::from)
    }

    fn get_dividends_for_holdings(&self, holding_ids: &[String]) -> Result<Vec<Dividend>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        dividends::table
            .filter(dividends::holding_id.eq_any(holding_ids))
            .order((
                dividends::holding_id.asc(),
                dividends::record_date.asc(),
                dividends::id.asc(),
            ))
            .load::<DividendDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Dividend::from).collect())
            .map_err(DividendError::from)
    }

    fn insert_dividend(
        &self,
        dividend: DividendDB,
        sync: ReinvestmentSync,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, DividendError, _>(|conn| {
            apply_reinvestment_sync(conn, &sync)?;
            diesel::insert_into(dividends::table)
                .values(&dividend)
                .execute(conn)?;
            sync_realized_gains(conn, &dividend.holding_id, gain_plan)?;
            Ok(())
        })?;

        Ok(dividend.into())
    }

    fn update_dividend(
        &self,
        dividend: DividendDB,
        sync: ReinvestmentSync,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, DividendError, _>(|conn| {
            // A dividend row referencing a transaction about to be deleted
            // must drop the link first; a new transaction must exist before
            // the row links to it.
            if matches!(sync, ReinvestmentSync::Delete(_)) {
                update_dividend_row(conn, &dividend)?;
                apply_reinvestment_sync(conn, &sync)?;
            } else {
                apply_reinvestment_sync(conn, &sync)?;
                update_dividend_row(conn, &dividend)?;
            }
            sync_realized_gains(conn, &dividend.holding_id, gain_plan)?;
            Ok(())
        })?;

        Ok(dividend.into())
    }

    fn delete_dividend(
        &self,
        dividend_id: &str,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Dividend> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| DividendError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, DividendError, _>(|conn| {
            let existing = dividends::table
                .find(dividend_id)
                .first::<DividendDB>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => DividendError::NotFound(format!(
                        "Dividend with id {} not found",
                        dividend_id
                    )),
                    _ => DividendError::DatabaseError(e.to_string()),
                })?;

            diesel::delete(dividends::table.find(dividend_id)).execute(conn)?;

            if let Some(reinvestment_id) = &existing.reinvestment_transaction_id {
                debug!(
                    "Deleting reinvestment transaction {} with dividend {}",
                    reinvestment_id, dividend_id
                );
                diesel::delete(transactions::table.find(reinvestment_id)).execute(conn)?;
            }

            sync_realized_gains(conn, &existing.holding_id, gain_plan)?;

            Ok(existing.into())
        })
    }
}
