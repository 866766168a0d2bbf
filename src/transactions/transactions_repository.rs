use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{dividends, realized_gains, transactions};

use super::transactions_errors::{Result, TransactionError};
use super::transactions_model::*;
use super::transactions_traits::TransactionRepositoryTrait;

/// Repository for managing transaction and realized-gain data in the database
pub struct TransactionRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

/// Reconciles the stored realized-gain rows of one holding's sells with
/// the desired end state: updates amounts in place, inserts rows for new
/// sells, deletes rows whose sell no longer produces a gain record.
/// Must run inside the caller's database transaction.
pub(crate) fn sync_realized_gains(
    conn: &mut SqliteConnection,
    holding_id: &str,
    desired: &[NewRealizedGain],
) -> std::result::Result<(), diesel::result::Error> {
    let now = chrono::Utc::now().naive_utc();

    let existing: Vec<RealizedGainDB> = realized_gains::table
        .inner_join(transactions::table.on(transactions::id.eq(realized_gains::transaction_id)))
        .filter(transactions::holding_id.eq(holding_id))
        .select(RealizedGainDB::as_select())
        .load::<RealizedGainDB>(conn)?;

    let desired_ids: HashSet<&str> = desired
        .iter()
        .map(|gain| gain.transaction_id.as_str())
        .collect();

    for stale in existing
        .iter()
        .filter(|row| !desired_ids.contains(row.transaction_id.as_str()))
    {
        diesel::delete(realized_gains::table.find(&stale.id)).execute(conn)?;
    }

    for gain in desired {
        let amount_text = gain.amount.to_string();
        match existing
            .iter()
            .find(|row| row.transaction_id == gain.transaction_id)
        {
            Some(row) if row.amount == amount_text => {}
            Some(row) => {
                diesel::update(realized_gains::table.find(&row.id))
                    .set((
                        realized_gains::amount.eq(&amount_text),
                        realized_gains::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }
            None => {
                let new_row = RealizedGainDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    transaction_id: gain.transaction_id.clone(),
                    amount: amount_text,
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(realized_gains::table)
                    .values(&new_row)
                    .execute(conn)?;
            }
        }
    }

    Ok(())
}

impl TransactionRepositoryTrait for TransactionRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let transaction = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => TransactionError::NotFound(format!(
                    "Transaction with id {} not found",
                    transaction_id
                )),
                _ => TransactionError::DatabaseError(e.to_string()),
            })?;

        Ok(transaction.into())
    }

    fn get_transactions_for_holding(&self, holding_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        transactions::table
            .filter(transactions::holding_id.eq(holding_id))
            .order((
                transactions::transaction_date.asc(),
                transactions::created_at.asc(),
                transactions::id.asc(),
            ))
            .load::<TransactionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Transaction::from).collect())
            .map_err(TransactionError::from)
    }

    fn get_transactions_for_holdings(
        &self,
        holding_ids: &[String],
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let mut query = transactions::table
            .filter(transactions::holding_id.eq_any(holding_ids))
            .into_boxed();

        if let Some(end) = up_to {
            query = query.filter(transactions::transaction_date.le(end));
        }

        query
            .order((
                transactions::transaction_date.asc(),
                transactions::created_at.asc(),
                transactions::id.asc(),
            ))
            .load::<TransactionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Transaction::from).collect())
            .map_err(TransactionError::from)
    }

    fn get_transactions_for_source(
        &self,
        source_transaction_id: &str,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        transactions::table
            .filter(transactions::source_transaction_id.eq(source_transaction_id))
            .order((
                transactions::transaction_date.asc(),
                transactions::created_at.asc(),
                transactions::id.asc(),
            ))
            .load::<TransactionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Transaction::from).collect())
            .map_err(TransactionError::from)
    }

    fn get_realized_gain_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<RealizedGain>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let row = realized_gains::table
            .filter(realized_gains::transaction_id.eq(transaction_id))
            .first::<RealizedGainDB>(&mut conn)
            .optional()?;

        Ok(row.map(RealizedGain::from))
    }

    fn is_reinvestment_linked(&self, transaction_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        let count: i64 = dividends::table
            .filter(dividends::reinvestment_transaction_id.eq(transaction_id))
            .count()
            .get_result(&mut conn)?;

        Ok(count > 0)
    }

    fn insert_transaction(
        &self,
        transaction: TransactionDB,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, TransactionError, _>(|conn| {
            diesel::insert_into(transactions::table)
                .values(&transaction)
                .execute(conn)?;
            sync_realized_gains(conn, &transaction.holding_id, gain_plan)?;
            Ok(())
        })?;

        Ok(transaction.into())
    }

    fn insert_transactions(
        &self,
        rows: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, TransactionError, _>(|conn| {
            let inserted = diesel::insert_into(transactions::table)
                .values(&rows)
                .execute(conn)?;
            for (holding_id, plan) in gain_plans {
                sync_realized_gains(conn, holding_id, plan)?;
            }
            Ok(inserted)
        })
    }

    fn update_transaction(
        &self,
        transaction: TransactionDB,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, TransactionError, _>(|conn| {
            let affected = diesel::update(transactions::table.find(&transaction.id))
                .set(&transaction)
                .execute(conn)?;
            if affected == 0 {
                return Err(TransactionError::NotFound(format!(
                    "Transaction with id {} not found",
                    transaction.id
                )));
            }
            sync_realized_gains(conn, &transaction.holding_id, gain_plan)?;
            Ok(())
        })?;

        Ok(transaction.into())
    }

    fn delete_transaction(
        &self,
        transaction_id: &str,
        gain_plan: &[NewRealizedGain],
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, TransactionError, _>(|conn| {
            let existing = transactions::table
                .find(transaction_id)
                .first::<TransactionDB>(conn)
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => TransactionError::NotFound(format!(
                        "Transaction with id {} not found",
                        transaction_id
                    )),
                    _ => TransactionError::DatabaseError(e.to_string()),
                })?;

            diesel::delete(
                realized_gains::table.filter(realized_gains::transaction_id.eq(transaction_id)),
            )
            .execute(conn)?;
            diesel::delete(transactions::table.find(transaction_id)).execute(conn)?;
            sync_realized_gains(conn, &existing.holding_id, gain_plan)?;

            Ok(existing.into())
        })
    }
}
