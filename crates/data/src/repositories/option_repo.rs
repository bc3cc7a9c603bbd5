//! Option trade repository.
//!
//! Besides CRUD, supports bulk import where a row matching an existing
//! trade on owner, underlying, strike and open date is skipped.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::now_ts;
use crate::models::{ImportSummary, NewOptionTrade, OptionFilter, OptionTradeRecord};

const COLUMNS: &str = "id, owner_id, underlying, option_type, side, strike, expiration, quantity, \
                       premium, fees, open_date, status, close_date, close_price, notes, created_at";

#[derive(Debug, Clone)]
pub struct OptionTradeRepository {
    pool: SqlitePool,
}

impl OptionTradeRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns an error if the insert fails, including a duplicate-key violation.
    pub async fn create(&self, owner_id: i64, trade: &NewOptionTrade) -> Result<OptionTradeRecord> {
        let record = sqlx::query_as::<_, OptionTradeRecord>(&format!(
            r"
            INSERT INTO option_trades
                (owner_id, underlying, option_type, side, strike, expiration, quantity,
                 premium, fees, open_date, status, close_date, close_price, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            RETURNING {COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(&trade.underlying)
        .bind(trade.option_type)
        .bind(trade.side)
        .bind(trade.strike)
        .bind(trade.expiration)
        .bind(trade.quantity)
        .bind(trade.premium)
        .bind(trade.fees)
        .bind(trade.open_date)
        .bind(trade.status)
        .bind(trade.close_date)
        .bind(trade.close_price)
        .bind(&trade.notes)
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<OptionTradeRecord>> {
        let record = sqlx::query_as::<_, OptionTradeRecord>(&format!(
            "SELECT {COLUMNS} FROM option_trades WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists an owner's option trades, newest opening first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_by_owner(
        &self,
        owner_id: i64,
        filter: &OptionFilter,
    ) -> Result<Vec<OptionTradeRecord>> {
        let underlying = filter
            .underlying
            .as_deref()
            .map(|u| u.trim().to_uppercase())
            .filter(|u| !u.is_empty());

        let records = sqlx::query_as::<_, OptionTradeRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM option_trades
            WHERE owner_id = ?1
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR underlying = ?3)
            ORDER BY open_date DESC, id DESC
            "
        ))
        .bind(owner_id)
        .bind(filter.status)
        .bind(underlying)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// # Errors
    /// Returns an error if the update fails, including a duplicate-key violation.
    pub async fn update(&self, id: i64, trade: &NewOptionTrade) -> Result<Option<OptionTradeRecord>> {
        let record = sqlx::query_as::<_, OptionTradeRecord>(&format!(
            r"
            UPDATE option_trades
            SET underlying = ?2, option_type = ?3, side = ?4, strike = ?5, expiration = ?6,
                quantity = ?7, premium = ?8, fees = ?9, open_date = ?10, status = ?11,
                close_date = ?12, close_price = ?13, notes = ?14
            WHERE id = ?1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(&trade.underlying)
        .bind(trade.option_type)
        .bind(trade.side)
        .bind(trade.strike)
        .bind(trade.expiration)
        .bind(trade.quantity)
        .bind(trade.premium)
        .bind(trade.fees)
        .bind(trade.open_date)
        .bind(trade.status)
        .bind(trade.close_date)
        .bind(trade.close_price)
        .bind(&trade.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM option_trades WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// True if the owner already has a trade on this underlying, strike and open date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn exists_duplicate(&self, owner_id: i64, trade: &NewOptionTrade) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM option_trades
            WHERE owner_id = ?1 AND underlying = ?2 AND strike = ?3 AND open_date = ?4
            ",
        )
        .bind(owner_id)
        .bind(trade.underlying.trim().to_uppercase())
        .bind(trade.strike)
        .bind(trade.open_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Imports rows one by one. Each row carries its number in the source
    /// input, which failure messages report. Invalid rows and insert failures
    /// are logged and counted, duplicates are skipped, and the loop always runs
    /// to the end.
    ///
    /// # Errors
    /// Returns an error only if the duplicate check itself cannot run.
    pub async fn import(
        &self,
        owner_id: i64,
        rows: Vec<(usize, NewOptionTrade)>,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (line, row) in rows {
            let row = row.normalized();

            if let Err(e) = row.validate() {
                warn!(line, error = %e, "Rejected option import row");
                summary.failed += 1;
                summary.errors.push(format!("row {line}: {e}"));
                continue;
            }

            if self.exists_duplicate(owner_id, &row).await? {
                summary.skipped += 1;
                continue;
            }

            match self.create(owner_id, &row).await {
                Ok(_) => summary.imported += 1,
                Err(e) => {
                    warn!(line, error = %e, "Failed to insert option import row");
                    summary.failed += 1;
                    summary.errors.push(format!("row {line}: {e}"));
                }
            }
        }

        info!(
            owner_id,
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            "Option import finished"
        );
        Ok(summary)
    }
}
