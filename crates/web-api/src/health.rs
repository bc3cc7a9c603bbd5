//! Health endpoint for monitoring the database and market-data freshness.
//!
//! `/api/health` reports whether the database answers, row counts per table,
//! and how stale each benchmark symbol's latest close is.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use trade_journal_data::KNOWN_TABLES;

use crate::state::AppState;

/// Row count for a single table.
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// Freshness of one market-data symbol.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolHealth {
    pub symbol: String,
    pub last_date: Option<NaiveDate>,
    /// Calendar days since the last close.
    pub staleness_days: Option<i64>,
    /// "healthy", "degraded", or "unhealthy".
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub tables: Vec<TableCount>,
    pub market_data: Vec<SymbolHealth>,
    pub summary: HealthSummary,
}

/// Staleness limits in calendar days. Daily closes skip weekends and holidays.
struct HealthThresholds {
    healthy: i64,
    degraded: i64,
}

impl HealthThresholds {
    const DAILY_CLOSES: Self = Self {
        healthy: 4,
        degraded: 10,
    };
}

fn determine_status(staleness_days: Option<i64>, thresholds: &HealthThresholds) -> String {
    match staleness_days {
        None => "unhealthy".to_string(),
        Some(d) if d <= thresholds.healthy => "healthy".to_string(),
        Some(d) if d <= thresholds.degraded => "degraded".to_string(),
        Some(_) => "unhealthy".to_string(),
    }
}

fn overall_status(database_ok: bool, symbols: &[SymbolHealth]) -> &'static str {
    if !database_ok {
        "unhealthy"
    } else if symbols.iter().any(|s| s.status != "healthy") {
        "degraded"
    } else {
        "healthy"
    }
}

/// GET /api/health
///
/// Responds 503 when the database is unreachable, 200 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let now = Utc::now();
    let today = now.date_naive();

    let database_ok = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let mut tables = Vec::with_capacity(KNOWN_TABLES.len());
    let mut market_data = Vec::new();

    if database_ok {
        for table in KNOWN_TABLES {
            match state.db.count_rows(table).await {
                Ok(rows) => tables.push(TableCount {
                    table: (*table).to_string(),
                    rows,
                }),
                Err(e) => tracing::error!(table, error = %e, "Failed to count rows"),
            }
        }

        match state.repos.market_prices.symbols().await {
            Ok(symbols) => {
                for symbol in symbols {
                    let last_date = match state.repos.market_prices.latest(&symbol).await {
                        Ok(latest) => latest.map(|p| p.price_date),
                        Err(e) => {
                            tracing::error!(%symbol, error = %e, "Failed to read latest close");
                            None
                        }
                    };
                    let staleness_days = last_date.map(|d| (today - d).num_days());
                    market_data.push(SymbolHealth {
                        status: determine_status(staleness_days, &HealthThresholds::DAILY_CLOSES),
                        symbol,
                        last_date,
                        staleness_days,
                    });
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to list market-data symbols"),
        }
    }

    let summary = HealthSummary {
        healthy: market_data.iter().filter(|s| s.status == "healthy").count(),
        degraded: market_data.iter().filter(|s| s.status == "degraded").count(),
        unhealthy: market_data.iter().filter(|s| s.status == "unhealthy").count(),
    };

    let code = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status: overall_status(database_ok, &market_data).to_string(),
            timestamp: now,
            database: if database_ok { "ok" } else { "unreachable" }.to_string(),
            tables,
            market_data,
            summary,
        }),
    )
}
