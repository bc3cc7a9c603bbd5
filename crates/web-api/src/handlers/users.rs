use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use trade_journal_data::{NewUser, Role, UserRecord, UserUpdate};

use super::ApiJson;
use crate::auth::{hash_password, validate_password, verify_password, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    pub new_password: String,
}

/// GET /api/users (admin)
///
/// # Errors
/// Returns `Forbidden` for non-admins.
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repos.users.list().await?))
}

/// POST /api/users (admin)
///
/// # Errors
/// Returns `BadRequest` for invalid fields and `Conflict` for a taken email.
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserRecord>), ApiError> {
    auth.require_admin()?;
    validate_password(&req.password)?;

    let mut user = NewUser {
        email: req.email,
        name: req.name,
        password_hash: String::new(),
        role: req.role,
    }
    .normalized();
    user.validate()?;

    if state.repos.users.find_by_email(&user.email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "A user with email {} already exists",
            user.email
        )));
    }

    user.password_hash = hash_password(req.password, state.config.auth.bcrypt_cost).await?;
    let created = state.repos.users.create(&user).await?;
    tracing::info!(user_id = created.id, by = auth.id, "User created");

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/users/:id (admin)
///
/// # Errors
/// Returns `NotFound` for an unknown user, `BadRequest` when demoting the last admin.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<UserRecord>, ApiError> {
    auth.require_admin()?;
    update.validate()?;

    let existing = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if existing.is_admin()
        && update.role == Some(Role::User)
        && state.repos.users.count_admins().await? <= 1
    {
        return Err(ApiError::BadRequest(
            "Cannot remove the last administrator".to_string(),
        ));
    }

    let updated = state
        .repos
        .users
        .update_profile(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(updated))
}

/// DELETE /api/users/:id (admin)
///
/// # Errors
/// Returns `BadRequest` when deleting oneself and `NotFound` for an unknown user.
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    if id == auth.id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !state.repos.users.delete(id).await? {
        return Err(ApiError::not_found("User"));
    }
    tracing::info!(user_id = id, by = auth.id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/:id/password
///
/// Users change their own password by proving the current one; admins may
/// reset anyone's.
///
/// # Errors
/// Returns `Forbidden` for another user's account unless admin, and
/// `BadRequest` for a missing or wrong current password.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let is_self = id == auth.id;
    if !is_self {
        auth.require_admin()?;
    }
    validate_password(&req.new_password)?;

    let user = state
        .repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if is_self {
        let current = req.current_password.ok_or_else(|| {
            ApiError::BadRequest("current_password: is required".to_string())
        })?;
        if !verify_password(current, user.password_hash).await? {
            return Err(ApiError::BadRequest(
                "current_password: is incorrect".to_string(),
            ));
        }
    }

    let hash = hash_password(req.new_password, state.config.auth.bcrypt_cost).await?;
    state.repos.users.update_password(id, &hash).await?;
    tracing::info!(user_id = id, by = auth.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
