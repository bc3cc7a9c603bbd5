use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use trade_journal_core::{InterestEstimate, MarginInterestEstimator, MarginTiers};

use super::ApiQuery;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MarginQuery {
    pub loan: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// GET /api/margin-interest?loan=&start=&end=
///
/// Interest on a constant loan for each day in `[start, end)`, priced at the
/// month's federal funds rate plus the blended tier spread.
///
/// # Errors
/// Returns `BadRequest` for an inverted range, a non-finite loan, or a
/// period with no stored rate at or before it.
pub async fn margin_interest(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<MarginQuery>,
) -> Result<Json<InterestEstimate>, ApiError> {
    if !query.loan.is_finite() {
        return Err(ApiError::BadRequest("loan: must be a finite number".to_string()));
    }

    let tiers = MarginTiers::try_from(&state.config.margin)?;
    let schedule = state.repos.fed_funds.schedule().await?;
    let estimator = MarginInterestEstimator::new(schedule, tiers, state.config.margin.day_count);

    Ok(Json(estimator.estimate(query.loan, query.start, query.end)?))
}
