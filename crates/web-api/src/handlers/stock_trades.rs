use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_core::{Position, PositionTracker};
use trade_journal_data::{DateRange, NewStockTrade, StockTradeFilter, StockTradeRecord};

use super::{ApiJson, ApiQuery, ScopeQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StockTradeQuery {
    pub user_id: Option<i64>,
    pub symbol: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub total_realized: f64,
}

async fn owned_trade(state: &AppState, auth: &AuthUser, id: i64) -> Result<StockTradeRecord, ApiError> {
    let trade = state
        .repos
        .stock_trades
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock trade"))?;
    auth.ensure_owner(trade.owner_id)?;
    Ok(trade)
}

/// GET /api/stock-trades
///
/// # Errors
/// Returns `BadRequest` for an inverted date range.
pub async fn list_trades(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<StockTradeQuery>,
) -> Result<Json<Vec<StockTradeRecord>>, ApiError> {
    let owner = auth.scope(query.user_id)?;
    DateRange::new(query.from, query.to).validate()?;

    let filter = StockTradeFilter {
        symbol: query.symbol,
        from: query.from,
        to: query.to,
    };
    Ok(Json(state.repos.stock_trades.list_by_owner(owner, &filter).await?))
}

/// POST /api/stock-trades
///
/// # Errors
/// Returns `BadRequest` for invalid fields.
pub async fn create_trade(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiJson(trade): ApiJson<NewStockTrade>,
) -> Result<(StatusCode, Json<StockTradeRecord>), ApiError> {
    let owner = auth.scope(scope.user_id)?;
    let trade = trade.normalized();
    trade.validate()?;

    let created = state.repos.stock_trades.create(owner, &trade).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/stock-trades/positions
///
/// Replays the owner's trades in date order through an average-cost tracker.
///
/// # Errors
/// Returns `Forbidden` when a non-admin names another user.
pub async fn positions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
) -> Result<Json<PositionsResponse>, ApiError> {
    let owner = auth.scope(scope.user_id)?;
    let trades = state
        .repos
        .stock_trades
        .list_by_owner(owner, &StockTradeFilter::default())
        .await?;

    let mut tracker = PositionTracker::new();
    for trade in &trades {
        tracker.process_fill(&trade.to_fill());
    }

    Ok(Json(PositionsResponse {
        total_realized: tracker.total_realized(),
        positions: tracker.positions(),
    }))
}

/// PUT /api/stock-trades/:id
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn update_trade(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(trade): ApiJson<NewStockTrade>,
) -> Result<Json<StockTradeRecord>, ApiError> {
    owned_trade(&state, &auth, id).await?;
    let trade = trade.normalized();
    trade.validate()?;

    let updated = state
        .repos
        .stock_trades
        .update(id, &trade)
        .await?
        .ok_or_else(|| ApiError::not_found("Stock trade"))?;
    Ok(Json(updated))
}

/// DELETE /api/stock-trades/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_trade(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    owned_trade(&state, &auth, id).await?;
    state.repos.stock_trades.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
