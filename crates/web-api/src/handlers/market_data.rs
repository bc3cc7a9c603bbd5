use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_journal_data::{DateRange, FedFundsRate, MarketPriceRecord, NewMarketPrice, ValidationError};

use super::{ApiJson, ApiQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub latest_date: Option<NaiveDate>,
    pub latest_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct WriteResponse {
    pub written: u64,
}

fn row_error(index: usize, err: &ValidationError) -> ApiError {
    ApiError::BadRequest(format!("row {}: {err}", index + 1))
}

/// GET /api/market-data
///
/// # Errors
/// Returns `Unauthorized` without a session.
pub async fn list_symbols(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<SymbolSummary>>, ApiError> {
    let symbols = state.repos.market_prices.symbols().await?;
    let mut summaries = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let latest = state.repos.market_prices.latest(&symbol).await?;
        summaries.push(SymbolSummary {
            latest_date: latest.as_ref().map(|p| p.price_date),
            latest_close: latest.as_ref().map(|p| p.close),
            symbol,
        });
    }
    Ok(Json(summaries))
}

/// GET /api/market-data/:symbol
///
/// # Errors
/// Returns `BadRequest` for an inverted range.
pub async fn get_prices(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(symbol): Path<String>,
    ApiQuery(query): ApiQuery<PriceQuery>,
) -> Result<Json<Vec<MarketPriceRecord>>, ApiError> {
    let range = DateRange::new(query.from, query.to);
    range.validate()?;
    Ok(Json(state.repos.market_prices.list(&symbol, range).await?))
}

/// POST /api/market-data (admin)
///
/// # Errors
/// Returns `Forbidden` for non-admins and `BadRequest` naming the first invalid row.
pub async fn upsert_prices(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(prices): ApiJson<Vec<NewMarketPrice>>,
) -> Result<Json<WriteResponse>, ApiError> {
    auth.require_admin()?;
    let prices: Vec<NewMarketPrice> = prices.into_iter().map(NewMarketPrice::normalized).collect();
    for (index, price) in prices.iter().enumerate() {
        price.validate().map_err(|e| row_error(index, &e))?;
    }

    let written = state.repos.market_prices.upsert_batch(&prices).await?;
    tracing::info!(written, "Market prices upserted");
    Ok(Json(WriteResponse { written }))
}

/// GET /api/market-data/fed-funds
///
/// # Errors
/// Returns `Unauthorized` without a session.
pub async fn list_fed_funds(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<FedFundsRate>>, ApiError> {
    Ok(Json(state.repos.fed_funds.list().await?))
}

/// POST /api/market-data/fed-funds (admin)
///
/// # Errors
/// Returns `Forbidden` for non-admins and `BadRequest` naming the first invalid row.
pub async fn upsert_fed_funds(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(rates): ApiJson<Vec<FedFundsRate>>,
) -> Result<Json<WriteResponse>, ApiError> {
    auth.require_admin()?;
    for (index, rate) in rates.iter().enumerate() {
        rate.validate().map_err(|e| row_error(index, &e))?;
    }

    let written = state.repos.fed_funds.upsert_batch(&rates).await?;
    tracing::info!(written, "Fed funds rates upserted");
    Ok(Json(WriteResponse { written }))
}
