//! Daily net-equity snapshots. One row per owner and date; writes upsert.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::now_ts;
use crate::models::{DateRange, NetEquityRecord, NewNetEquity};

const COLUMNS: &str = "id, owner_id, record_date, net_equity, created_at";

const UPSERT_SQL: &str = r"
    INSERT INTO net_equity (owner_id, record_date, net_equity, created_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (owner_id, record_date) DO UPDATE SET net_equity = excluded.net_equity
    RETURNING id, owner_id, record_date, net_equity, created_at
";

#[derive(Debug, Clone)]
pub struct NetEquityRepository {
    pool: SqlitePool,
}

impl NetEquityRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the snapshot or replaces the value already stored for that date.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert(&self, owner_id: i64, snapshot: &NewNetEquity) -> Result<NetEquityRecord> {
        let record = sqlx::query_as::<_, NetEquityRecord>(UPSERT_SQL)
            .bind(owner_id)
            .bind(snapshot.record_date)
            .bind(snapshot.net_equity)
            .bind(now_ts())
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    /// Upserts many snapshots in one transaction.
    ///
    /// # Errors
    /// Returns an error if any write fails; nothing is committed in that case.
    pub async fn upsert_batch(
        &self,
        owner_id: i64,
        snapshots: &[NewNetEquity],
    ) -> Result<Vec<NetEquityRecord>> {
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }

        let now = now_ts();
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(snapshots.len());

        for snapshot in snapshots {
            let record = sqlx::query_as::<_, NetEquityRecord>(UPSERT_SQL)
                .bind(owner_id)
                .bind(snapshot.record_date)
                .bind(snapshot.net_equity)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(record);
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<NetEquityRecord>> {
        let record = sqlx::query_as::<_, NetEquityRecord>(&format!(
            "SELECT {COLUMNS} FROM net_equity WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_by_owner(&self, owner_id: i64, range: DateRange) -> Result<Vec<NetEquityRecord>> {
        let records = sqlx::query_as::<_, NetEquityRecord>(&format!(
            r"
            SELECT {COLUMNS}
            FROM net_equity
            WHERE owner_id = ?1
              AND (?2 IS NULL OR record_date >= ?2)
              AND (?3 IS NULL OR record_date <= ?3)
            ORDER BY record_date ASC
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
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM net_equity WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
