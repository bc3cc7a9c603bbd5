use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// `SQLite` database handle.
///
/// Owns the connection pool and applies the embedded migrations on connect.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the database at `database_url` and runs migrations.
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` URL (e.g., `sqlite://data/trade_journal.db`)
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, the connection fails, or migrations fail.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {database_url}"))?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::info!(url = database_url, "Database ready");
        Ok(db)
    }

    /// Creates an in-memory database for testing.
    ///
    /// A single never-recycled connection keeps the in-memory schema alive for
    /// the lifetime of the pool.
    ///
    /// # Errors
    ///
    /// Returns error if connection or migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trips a trivial query.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Counts rows in one of the known tables.
    ///
    /// # Errors
    ///
    /// Returns error for an unknown table name or a failed query.
    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        // Table names cannot be bound; only allow the known set.
        if !KNOWN_TABLES.contains(&table) {
            anyhow::bail!("Unknown table: {table}");
        }
        let query = format!("SELECT COUNT(*) FROM {table}");
        let (count,): (i64,) = sqlx::query_as(&query).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub const KNOWN_TABLES: &[&str] = &[
    "users",
    "stock_trades",
    "option_trades",
    "deposits",
    "net_equity",
    "market_prices",
    "fed_funds_rates",
    "projects",
    "project_items",
    "item_comments",
];

/// Current unix timestamp in seconds, used for audit columns.
#[must_use]
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
