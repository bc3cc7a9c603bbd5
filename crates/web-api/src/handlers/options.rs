use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use trade_journal_data::{
    ImportSummary, NewOptionTrade, OptionCsvImporter, OptionFilter, OptionStatus, OptionSummary,
    OptionTradeRecord,
};

use super::{ApiJson, ApiQuery, ScopeQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OptionQuery {
    pub user_id: Option<i64>,
    pub status: Option<OptionStatus>,
    pub underlying: Option<String>,
}

/// JSON import body: a bare array of rows or `{"rows": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportBody {
    Rows(Vec<Value>),
    Wrapped { rows: Vec<Value> },
}

async fn owned_option(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
) -> Result<OptionTradeRecord, ApiError> {
    let trade = state
        .repos
        .options
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Option trade"))?;
    auth.ensure_owner(trade.owner_id)?;
    Ok(trade)
}

fn duplicate_option() -> ApiError {
    ApiError::Conflict(
        "An option trade with this underlying, strike and open date already exists".to_string(),
    )
}

/// GET /api/options
///
/// # Errors
/// Returns `Forbidden` when a non-admin names another user.
pub async fn list_options(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<OptionQuery>,
) -> Result<Json<Vec<OptionTradeRecord>>, ApiError> {
    let owner = auth.scope(query.user_id)?;
    let filter = OptionFilter {
        status: query.status,
        underlying: query.underlying,
    };
    Ok(Json(state.repos.options.list_by_owner(owner, &filter).await?))
}

/// POST /api/options
///
/// # Errors
/// Returns `BadRequest` for invalid fields and `Conflict` for a duplicate.
pub async fn create_option(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiJson(trade): ApiJson<NewOptionTrade>,
) -> Result<(StatusCode, Json<OptionTradeRecord>), ApiError> {
    let owner = auth.scope(scope.user_id)?;
    let trade = trade.normalized();
    trade.validate()?;

    if state.repos.options.exists_duplicate(owner, &trade).await? {
        return Err(duplicate_option());
    }

    let created = state.repos.options.create(owner, &trade).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/options/summary
///
/// # Errors
/// Returns `Forbidden` when a non-admin names another user.
pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
) -> Result<Json<OptionSummary>, ApiError> {
    let owner = auth.scope(scope.user_id)?;
    let trades = state
        .repos
        .options
        .list_by_owner(owner, &OptionFilter::default())
        .await?;
    Ok(Json(OptionSummary::from_trades(&trades)))
}

/// POST /api/options/import
///
/// Accepts `text/csv` or JSON. Rows that fail to parse or validate are
/// counted as failed, duplicates as skipped; the rest are inserted.
///
/// # Errors
/// Returns `BadRequest` if the body as a whole cannot be read.
pub async fn import_options(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ImportSummary>, ApiError> {
    let owner = auth.scope(scope.user_id)?;

    let is_csv = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/csv"));

    let (rows, rejected) = if is_csv {
        let parsed = OptionCsvImporter::parse(body.as_bytes())
            .map_err(|e| ApiError::BadRequest(format!("Invalid CSV: {e}")))?;
        (parsed.rows, parsed.rejected)
    } else {
        let values = match serde_json::from_str::<ImportBody>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))?
        {
            ImportBody::Rows(rows) | ImportBody::Wrapped { rows } => rows,
        };

        let mut rows = Vec::with_capacity(values.len());
        let mut rejected = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            let line = index + 1;
            match serde_json::from_value::<NewOptionTrade>(value) {
                Ok(row) => rows.push((line, row)),
                Err(e) => rejected.push(format!("row {line}: {e}")),
            }
        }
        (rows, rejected)
    };

    for message in &rejected {
        tracing::warn!(owner, row = %message, "Unparseable option import row");
    }

    let mut summary = state.repos.options.import(owner, rows).await?;
    summary.record_rejected(rejected);
    Ok(Json(summary))
}

/// PUT /api/options/:id
///
/// # Errors
/// Returns `NotFound`, `Forbidden`, `BadRequest`, or `Conflict` when the edit
/// collides with another trade.
pub async fn update_option(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(trade): ApiJson<NewOptionTrade>,
) -> Result<Json<OptionTradeRecord>, ApiError> {
    owned_option(&state, &auth, id).await?;
    let trade = trade.normalized();
    trade.validate()?;

    let updated = state
        .repos
        .options
        .update(id, &trade)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => duplicate_option(),
            other => other,
        })?
        .ok_or_else(|| ApiError::not_found("Option trade"))?;
    Ok(Json(updated))
}

/// DELETE /api/options/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_option(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    owned_option(&state, &auth, id).await?;
    state.repos.options.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
