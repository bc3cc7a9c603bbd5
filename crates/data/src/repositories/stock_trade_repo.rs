//! Stock trade repository.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::now_ts;
use crate::models::{NewStockTrade, StockTradeFilter, StockTradeRecord};

const COLUMNS: &str =
    "id, owner_id, symbol, side, quantity, price, fees, trade_date, notes, created_at";

#[derive(Debug, Clone)]
pub struct StockTradeRepository {
    pool: SqlitePool,
}

impl StockTradeRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn create(&self, owner_id: i64, trade: &NewStockTrade) -> Result<StockTradeRecord> {
        let record = sqlx::query_as::<_, StockTradeRecord>(&format!(
            r"
            INSERT INTO stock_trades
                (owner_id, symbol, side, quantity, price, fees, trade_date, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(&trade.symbol)
        .bind(trade.side)
        .bind(trade.quantity)
        .bind(trade.price)
        .bind(trade.fees)
        .bind(trade.trade_date)
        .bind(&trade.notes)
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<StockTradeRecord>> {
        let record = sqlx::query_as::<_, StockTradeRecord>(&format!(
            "SELECT {COLUMNS} FROM stock_trades WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists an owner's trades, oldest first, optionally narrowed by symbol and date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        filter: &StockTradeFilter,
    ) -> Result<Vec<StockTradeRecord>> {
        let records = sqlx::query_as::<_, StockTradeRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM stock_trades
            WHERE owner_id = ?1
              AND (?2 IS NULL OR symbol = ?2)
              AND (?3 IS NULL OR trade_date >= ?3)
              AND (?4 IS NULL OR trade_date <= ?4)
            ORDER BY trade_date ASC, id ASC
            "
        ))
        .bind(owner_id)
        .bind(filter.normalized_symbol())
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Replaces every editable field. Returns `None` if the row does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update(&self, id: i64, trade: &NewStockTrade) -> Result<Option<StockTradeRecord>> {
        let record = sqlx::query_as::<_, StockTradeRecord>(&format!(
            r"
            UPDATE stock_trades
            SET symbol = ?2, side = ?3, quantity = ?4, price = ?5, fees = ?6,
                trade_date = ?7, notes = ?8
            WHERE id = ?1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&trade.symbol)
        .bind(trade.side)
        .bind(trade.quantity)
        .bind(trade.price)
        .bind(trade.fees)
        .bind(trade.trade_date)
        .bind(&trade.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stock_trades WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
