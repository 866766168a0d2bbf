use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::{external_transactions, realized_gains, transactions};
use crate::transactions::transactions_repository::sync_realized_gains;
use crate::transactions::{NewRealizedGain, TransactionDB};

use super::allocations_constants::*;
use super::allocations_errors::{AllocationError, Result};
use super::allocations_model::*;
use super::allocations_traits::AllocationRepositoryTrait;

/// Repository for managing external transactions and their derived rows
pub struct AllocationRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl AllocationRepository {
    /// Creates a new AllocationRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

/// Deletes every transaction derived from the source, with their
/// realized-gain rows. Must run inside the caller's database transaction.
fn delete_derived_rows(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> std::result::Result<usize, diesel::result::Error> {
    let derived_ids: Vec<String> = transactions::table
        .filter(transactions::source_transaction_id.eq(external_id))
        .select(transactions::id)
        .load::<String>(conn)?;

    diesel::delete(
        realized_gains::table.filter(realized_gains::transaction_id.eq_any(&derived_ids)),
    )
    .execute(conn)?;
    diesel::delete(transactions::table.filter(transactions::id.eq_any(&derived_ids)))
        .execute(conn)
}

fn set_source_status(
    conn: &mut SqliteConnection,
    external_id: &str,
    status: &str,
) -> std::result::Result<usize, diesel::result::Error> {
    diesel::update(external_transactions::table.find(external_id))
        .set((
            external_transactions::status.eq(status),
            external_transactions::updated_at.eq(chrono::Utc::now().naive_utc()),
        ))
        .execute(conn)
}

impl AllocationRepositoryTrait for AllocationRepository {
    fn get_external_transaction(&self, external_id: &str) -> Result<ExternalTransaction> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        let row = external_transactions::table
            .find(external_id)
            .first::<ExternalTransactionDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AllocationError::NotFound(format!(
                    "External transaction with id {} not found",
                    external_id
                )),
                _ => AllocationError::DatabaseError(e.to_string()),
            })?;

        Ok(row.into())
    }

    fn get_external_transactions(
        &self,
        status_filter: Option<&str>,
    ) -> Result<Vec<ExternalTransaction>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        let mut query = external_transactions::table.into_boxed();
        if let Some(status) = status_filter {
            query = query.filter(external_transactions::status.eq(status.to_string()));
        }

        query
            .order((
                external_transactions::transaction_date.asc(),
                external_transactions::id.asc(),
            ))
            .load::<ExternalTransactionDB>(&mut conn)
            .map(|rows| rows.into_iter().map(ExternalTransaction::from).collect())
            .map_err(AllocationError::from)
    }

    fn create_external_transaction(
        &self,
        new_external: NewExternalTransaction,
    ) -> Result<ExternalTransaction> {
        new_external.validate()?;

        let mut row: ExternalTransactionDB = new_external.into();
        if row.id.is_empty() {
            row.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        diesel::insert_into(external_transactions::table)
            .values(&row)
            .execute(&mut conn)?;

        Ok(row.into())
    }

    fn apply_allocation(
        &self,
        external_id: &str,
        derived_rows: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, AllocationError, _>(|conn| {
            diesel::insert_into(transactions::table)
                .values(&derived_rows)
                .execute(conn)?;
            for (holding_id, plan) in gain_plans {
                sync_realized_gains(conn, holding_id, plan)?;
            }
            set_source_status(conn, external_id, EXTERNAL_TRANSACTION_STATUS_PROCESSED)?;
            debug!(
                "Allocated external transaction {} into {} transactions",
                external_id,
                derived_rows.len()
            );
            Ok(())
        })
    }

    fn replace_allocation(
        &self,
        external_id: &str,
        derived_rows: Vec<TransactionDB>,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, AllocationError, _>(|conn| {
            let removed = delete_derived_rows(conn, external_id)?;
            diesel::insert_into(transactions::table)
                .values(&derived_rows)
                .execute(conn)?;
            for (holding_id, plan) in gain_plans {
                sync_realized_gains(conn, holding_id, plan)?;
            }
            debug!(
                "Replaced {} derived transactions of external transaction {} with {}",
                removed,
                external_id,
                derived_rows.len()
            );
            Ok(())
        })
    }

    fn remove_allocation(
        &self,
        external_id: &str,
        gain_plans: &[(String, Vec<NewRealizedGain>)],
    ) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AllocationError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, AllocationError, _>(|conn| {
            let removed = delete_derived_rows(conn, external_id)?;
            for (holding_id, plan) in gain_plans {
                sync_realized_gains(conn, holding_id, plan)?;
            }
            set_source_status(conn, external_id, EXTERNAL_TRANSACTION_STATUS_PENDING)?;
            debug!(
                "Unallocated external transaction {} ({} derived transactions removed)",
                external_id, removed
            );
            Ok(())
        })
    }
}
