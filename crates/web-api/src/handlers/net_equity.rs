use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::{
    benchmark_returns, time_weighted_return, CashFlow, EquityPoint, PerformanceParams,
    PerformanceReport,
};
use trade_journal_data::{DateRange, DepositRecord, NetEquityRecord, NewNetEquity};

use super::deposits::RangeQuery;
use super::{ApiJson, ApiQuery, ScopeQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// A single snapshot or a batch.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum NetEquityPayload {
    One(NewNetEquity),
    Many(Vec<NewNetEquity>),
}

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub user_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub benchmark: Option<String>,
}

#[derive(Serialize)]
pub struct BenchmarkReport {
    pub symbol: String,
    pub report: PerformanceReport,
}

#[derive(Serialize)]
pub struct PerformanceResponse {
    pub portfolio: PerformanceReport,
    pub benchmark: Option<BenchmarkReport>,
    /// Portfolio cumulative return minus the benchmark's over the same dates.
    pub excess_return: Option<f64>,
}

/// GET /api/net-equity
///
/// # Errors
/// Returns `BadRequest` for an inverted range.
pub async fn list_net_equity(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<NetEquityRecord>>, ApiError> {
    let owner = auth.scope(query.user_id)?;
    let range = query.range()?;
    Ok(Json(state.repos.net_equity.list_by_owner(owner, range).await?))
}

/// POST /api/net-equity
///
/// Upserts one snapshot or many; an existing value for the same date is replaced.
///
/// # Errors
/// Returns `BadRequest` if any snapshot is invalid; nothing is written then.
pub async fn upsert_net_equity(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiJson(payload): ApiJson<NetEquityPayload>,
) -> Result<Json<Vec<NetEquityRecord>>, ApiError> {
    let owner = auth.scope(scope.user_id)?;
    let snapshots = match payload {
        NetEquityPayload::One(one) => vec![one],
        NetEquityPayload::Many(many) => many,
    };
    for snapshot in &snapshots {
        snapshot.validate()?;
    }

    let stored = state.repos.net_equity.upsert_batch(owner, &snapshots).await?;
    Ok(Json(stored))
}

/// DELETE /api/net-equity/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_net_equity(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let record = state
        .repos
        .net_equity
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Net equity record"))?;
    auth.ensure_owner(record.owner_id)?;
    state.repos.net_equity.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/net-equity/performance
///
/// Time-weighted return over the owner's snapshots, with deposits and
/// withdrawals as external flows. With `benchmark=SYMBOL`, the same
/// statistics are computed over that symbol's closes between the first and
/// last snapshot dates.
///
/// # Errors
/// Returns `BadRequest` with fewer than two snapshots in range.
pub async fn performance(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<PerformanceQuery>,
) -> Result<Json<PerformanceResponse>, ApiError> {
    let owner = auth.scope(query.user_id)?;
    let range = DateRange::new(query.from, query.to);
    range.validate()?;

    let equity: Vec<EquityPoint> = state
        .repos
        .net_equity
        .list_by_owner(owner, range)
        .await?
        .iter()
        .map(NetEquityRecord::to_point)
        .collect();
    let flows: Vec<CashFlow> = state
        .repos
        .deposits
        .list_by_owner(owner, range)
        .await?
        .iter()
        .map(DepositRecord::to_cash_flow)
        .collect();

    let params = PerformanceParams::from(&state.config.performance);
    let portfolio = time_weighted_return(&equity, &flows, params)?;

    let benchmark = match query.benchmark.as_deref().map(str::trim) {
        Some(symbol) if !symbol.is_empty() => {
            let window = DateRange::new(Some(portfolio.start_date), Some(portfolio.end_date));
            let prices: Vec<EquityPoint> = state
                .repos
                .market_prices
                .list(symbol, window)
                .await?
                .iter()
                .map(|p| p.to_point())
                .collect();
            match benchmark_returns(&prices, params) {
                Ok(report) => Some(BenchmarkReport {
                    symbol: symbol.to_uppercase(),
                    report,
                }),
                Err(e) => {
                    tracing::debug!(symbol, error = %e, "Benchmark unavailable");
                    None
                }
            }
        }
        _ => None,
    };

    let excess_return = benchmark
        .as_ref()
        .map(|b| portfolio.cumulative_return - b.report.cumulative_return);

    Ok(Json(PerformanceResponse {
        portfolio,
        benchmark,
        excess_return,
    }))
}
