use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use trade_journal_data::{DateRange, DepositRecord, NewDeposit};

use super::{ApiJson, ApiQuery, ScopeQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub user_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RangeQuery {
    /// # Errors
    /// Returns `BadRequest` when `to` is before `from`.
    pub fn range(&self) -> Result<DateRange, ApiError> {
        let range = DateRange::new(self.from, self.to);
        range.validate()?;
        Ok(range)
    }
}

async fn owned_deposit(state: &AppState, auth: &AuthUser, id: i64) -> Result<DepositRecord, ApiError> {
    let deposit = state
        .repos
        .deposits
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deposit"))?;
    auth.ensure_owner(deposit.owner_id)?;
    Ok(deposit)
}

/// GET /api/deposits
///
/// # Errors
/// Returns `BadRequest` for an inverted range.
pub async fn list_deposits(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<DepositRecord>>, ApiError> {
    let owner = auth.scope(query.user_id)?;
    let range = query.range()?;
    Ok(Json(state.repos.deposits.list_by_owner(owner, range).await?))
}

/// POST /api/deposits
///
/// # Errors
/// Returns `BadRequest` for a non-positive amount.
pub async fn create_deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiJson(deposit): ApiJson<NewDeposit>,
) -> Result<(StatusCode, Json<DepositRecord>), ApiError> {
    let owner = auth.scope(scope.user_id)?;
    deposit.validate()?;
    let created = state.repos.deposits.create(owner, &deposit).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/deposits/:id
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn update_deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(deposit): ApiJson<NewDeposit>,
) -> Result<Json<DepositRecord>, ApiError> {
    owned_deposit(&state, &auth, id).await?;
    deposit.validate()?;
    let updated = state
        .repos
        .deposits
        .update(id, &deposit)
        .await?
        .ok_or_else(|| ApiError::not_found("Deposit"))?;
    Ok(Json(updated))
}

/// DELETE /api/deposits/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_deposit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    owned_deposit(&state, &auth, id).await?;
    state.repos.deposits.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
