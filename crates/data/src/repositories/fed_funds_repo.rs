//! Monthly federal funds rates backing the margin-interest estimator.

use anyhow::{anyhow, Result};
use sqlx::SqlitePool;
use trade_journal_core::margin::parse_month;
use trade_journal_core::FedFundsSchedule;

use crate::models::FedFundsRate;

const UPSERT_SQL: &str = r"
    INSERT INTO fed_funds_rates (month, rate) VALUES (?1, ?2)
    ON CONFLICT (month) DO UPDATE SET rate = excluded.rate
";

fn storage_month(rate: &FedFundsRate) -> Result<String> {
    rate.canonical_month()
        .ok_or_else(|| anyhow!("Invalid fed funds month '{}', expected YYYY-MM", rate.month))
}

#[derive(Debug, Clone)]
pub struct FedFundsRepository {
    pool: SqlitePool,
}

impl FedFundsRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores the rate under its zero-padded month.
    ///
    /// # Errors
    /// Returns an error for a malformed month or if the write fails.
    pub async fn upsert(&self, rate: &FedFundsRate) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(storage_month(rate)?)
            .bind(rate.rate)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Upserts every rate in one transaction and returns the number written.
    ///
    /// # Errors
    /// Returns an error for a malformed month or if any write fails; nothing
    /// is committed in that case.
    pub async fn upsert_batch(&self, rates: &[FedFundsRate]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for rate in rates {
            let result = sqlx::query(UPSERT_SQL)
                .bind(storage_month(rate)?)
                .bind(rate.rate)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list(&self) -> Result<Vec<FedFundsRate>> {
        let rows = sqlx::query_as::<_, FedFundsRate>(
            "SELECT month, rate FROM fed_funds_rates ORDER BY month ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Loads every stored month into a lookup schedule. Malformed months are ignored.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn schedule(&self) -> Result<FedFundsSchedule> {
        let mut schedule = FedFundsSchedule::new();
        for row in self.list().await? {
            if let Some((year, month)) = parse_month(&row.month) {
                schedule.insert(year, month, row.rate);
            }
        }
        Ok(schedule)
    }
}
