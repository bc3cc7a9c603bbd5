//! Benchmark closing prices, shared across tenants.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::{DateRange, MarketPriceRecord, NewMarketPrice};

const COLUMNS: &str = "id, symbol, price_date, close";

#[derive(Debug, Clone)]
pub struct MarketPriceRepository {
    pool: SqlitePool,
}

impl MarketPriceRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upserts closes in one transaction and returns the number written.
    ///
    /// # Errors
    /// Returns an error if any write fails.
    pub async fn upsert_batch(&self, prices: &[NewMarketPrice]) -> Result<u64> {
        if prices.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for price in prices {
            let result = sqlx::query(
                r"
                INSERT INTO market_prices (symbol, price_date, close)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (symbol, price_date) DO UPDATE SET close = excluded.close
                ",
            )
            .bind(price.symbol.trim().to_uppercase())
            .bind(price.price_date)
            .bind(price.close)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list(&self, symbol: &str, range: DateRange) -> Result<Vec<MarketPriceRecord>> {
        let records = sqlx::query_as::<_, MarketPriceRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM market_prices
            WHERE symbol = ?1
              AND (?2 IS NULL OR price_date >= ?2)
              AND (?3 IS NULL OR price_date <= ?3)
            ORDER BY price_date ASC
            "
        ))
        .bind(symbol.trim().to_uppercase())
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Most recent close for a symbol.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn latest(&self, symbol: &str) -> Result<Option<MarketPriceRecord>> {
        let record = sqlx::query_as::<_, MarketPriceRecord>(&format!(
            "SELECT {COLUMNS} FROM market_prices WHERE symbol = ?1 ORDER BY price_date DESC LIMIT 1"
        ))
        .bind(symbol.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn symbols(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT symbol FROM market_prices ORDER BY symbol ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
