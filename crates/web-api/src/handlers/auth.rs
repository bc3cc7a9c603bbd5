use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use trade_journal_data::UserRecord;

use super::ApiJson;
use crate::auth::{clear_cookie, session_cookie, verify_password, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    pub token: String,
}

/// POST /api/auth/login
///
/// # Errors
/// Returns `Unauthorized` for an unknown email or a wrong password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let rejected = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = state.repos.users.find_by_email(&req.email).await? else {
        tracing::warn!(email = %req.email, "Login for unknown account");
        return Err(rejected());
    };

    if !verify_password(req.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = user.id, "Login with wrong password");
        return Err(rejected());
    }

    let token = state
        .signer
        .sign(&user)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;
    let cookie = session_cookie(&state.config.auth, &token, state.signer.ttl_seconds());
    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { user, token }),
    )
        .into_response())
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(&state.config.auth))],
    )
        .into_response()
}

/// GET /api/auth/me
///
/// # Errors
/// Returns `Unauthorized` without a valid session.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserRecord>, ApiError> {
    let user = state
        .repos
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user))
}
