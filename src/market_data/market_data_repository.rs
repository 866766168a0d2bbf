use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::schema::price_points;

use super::market_data_errors::{MarketDataError, Result};
use super::market_data_model::{NewPricePoint, PricePoint, PricePointDB};
use super::market_data_traits::MarketDataRepositoryTrait;

/// Repository for managing price data in the database
pub struct MarketDataRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl MarketDataRepository {
    /// Creates a new MarketDataRepository instance
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl MarketDataRepositoryTrait for MarketDataRepository {
    fn get_prices_for_funds(
        &self,
        fund_ids: &[String],
        up_to: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| MarketDataError::DatabaseError(e.to_string()))?;

        let mut query = price_points::table
            .filter(price_points::fund_id.eq_any(fund_ids))
            .into_boxed();

        if let Some(end) = up_to {
            query = query.filter(price_points::price_date.le(end));
        }

        query
            .order((price_points::fund_id.asc(), price_points::price_date.asc()))
            .load::<PricePointDB>(&mut conn)
            .map(|rows| rows.into_iter().map(PricePoint::from).collect())
            .map_err(MarketDataError::from)
    }

    fn upsert_price_points(&self, new_prices: Vec<NewPricePoint>) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| MarketDataError::DatabaseError(e.to_string()))?;

        let now = chrono::Utc::now().naive_utc();

        conn.transaction::<_, MarketDataError, _>(|conn| {
            let mut written = 0;
            for new_price in new_prices {
                new_price.validate()?;

                let price_date =
                    NaiveDate::parse_from_str(&new_price.price_date, "%Y-%m-%d").map_err(|_| {
                        MarketDataError::InvalidData(format!(
                            "Invalid price date: {}",
                            new_price.price_date
                        ))
                    })?;

                let row = PricePointDB {
                    id: uuid::Uuid::new_v4().to_string(),
                    fund_id: new_price.fund_id,
                    price_date,
                    price: new_price.price.to_string(),
                    currency: new_price.currency,
                    created_at: now,
                    updated_at: now,
                };

                // One row per (fund, date); re-imports overwrite the price.
                written += diesel::insert_into(price_points::table)
                    .values(&row)
                    .on_conflict((price_points::fund_id, price_points::price_date))
                    .do_update()
                    .set((
                        price_points::price.eq(&row.price),
                        price_points::currency.eq(&row.currency),
                        price_points::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }
            Ok(written)
        })
    }

    fn delete_price_point(&self, price_point_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| MarketDataError::DatabaseError(e.to_string()))?;

        let affected =
            diesel::delete(price_points::table.find(price_point_id)).execute(&mut conn)?;

        if affected == 0 {
            return Err(MarketDataError::NotFound(format!(
                "Price point with id {} not found",
                price_point_id
            )));
        }

        Ok(())
    }
}
