//! Deposit / withdrawal repository.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::now_ts;
use crate::models::{DateRange, DepositRecord, NewDeposit};

const COLUMNS: &str = "id, owner_id, deposit_date, amount, kind, notes, created_at";

#[derive(Debug, Clone)]
pub struct DepositRepository {
    pool: SqlitePool,
}

impl DepositRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn create(&self, owner_id: i64, deposit: &NewDeposit) -> Result<DepositRecord> {
        let record = sqlx::query_as::<_, DepositRecord>(&format!(
            r"
            INSERT INTO deposits (owner_id, deposit_date, amount, kind, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(deposit.deposit_date)
        .bind(deposit.amount)
        .bind(deposit.kind)
        .bind(&deposit.notes)
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<DepositRecord>> {
        let record = sqlx::query_as::<_, DepositRecord>(&format!(
            "SELECT {COLUMNS} FROM deposits WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists an owner's cash movements in date order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_by_owner(&self, owner_id: i64, range: DateRange) -> Result<Vec<DepositRecord>> {
        let records = sqlx::query_as::<_, DepositRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM deposits
            WHERE owner_id = ?1
              AND (?2 IS NULL OR deposit_date >= ?2)
              AND (?3 IS NULL OR deposit_date <= ?3)
            ORDER BY deposit_date ASC, id ASC
            "
        ))
        .bind(owner_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update(&self, id: i64, deposit: &NewDeposit) -> Result<Option<DepositRecord>> {
        let record = sqlx::query_as::<_, DepositRecord>(&format!(
            r"
            UPDATE deposits
            SET deposit_date = ?2, amount = ?3, kind = ?4, notes = ?5
            WHERE id = ?1
            RETURNING {COLUMNS}
            "
        ))
        .bind(id)
        .bind(deposit.deposit_date)
        .bind(deposit.amount)
        .bind(deposit.kind)
        .bind(&deposit.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deposits WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
