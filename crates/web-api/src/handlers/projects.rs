//! Projects, items and comments. Items and comments inherit access from
//! their project: the owner or an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use trade_journal_data::{
    CommentRecord, ItemRecord, ItemUpdate, NewComment, NewItem, NewProject, ProjectRecord,
    ProjectUpdate,
};

use super::{ApiJson, ApiQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub user_id: Option<i64>,
    /// Admin only: list every tenant's projects.
    #[serde(default)]
    pub all: bool,
}

#[derive(Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectRecord,
    pub items: Vec<ItemRecord>,
}

async fn accessible_project(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
) -> Result<ProjectRecord, ApiError> {
    let project = state
        .repos
        .projects
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    auth.ensure_owner(project.owner_id)?;
    Ok(project)
}

async fn accessible_item(
    state: &AppState,
    auth: &AuthUser,
    id: i64,
) -> Result<(ItemRecord, ProjectRecord), ApiError> {
    let item = state
        .repos
        .projects
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;
    let project = accessible_project(state, auth, item.project_id).await?;
    Ok((item, project))
}

/// GET /api/projects
///
/// # Errors
/// Returns `Forbidden` when a non-admin asks for another tenant or for all.
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<Json<Vec<ProjectRecord>>, ApiError> {
    if query.all {
        auth.require_admin()?;
        return Ok(Json(state.repos.projects.list_all().await?));
    }
    let owner = auth.scope(query.user_id)?;
    Ok(Json(state.repos.projects.list_by_owner(owner).await?))
}

/// POST /api/projects
///
/// # Errors
/// Returns `BadRequest` for an empty name.
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(project): ApiJson<NewProject>,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    project.validate()?;
    let created = state.repos.projects.create(auth.id, &project).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/projects/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let project = accessible_project(&state, &auth, id).await?;
    let items = state.repos.projects.list_items(id).await?;
    Ok(Json(ProjectDetail { project, items }))
}

/// PUT /api/projects/:id
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<ProjectUpdate>,
) -> Result<Json<ProjectRecord>, ApiError> {
    accessible_project(&state, &auth, id).await?;
    update.validate()?;
    let updated = state
        .repos
        .projects
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(updated))
}

/// DELETE /api/projects/:id
///
/// Removes the project with all of its items and their comments.
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    accessible_project(&state, &auth, id).await?;
    state.repos.projects.delete(id).await?;
    tracing::info!(project_id = id, by = auth.id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/:id/items
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<ItemRecord>>, ApiError> {
    accessible_project(&state, &auth, project_id).await?;
    Ok(Json(state.repos.projects.list_items(project_id).await?))
}

/// POST /api/projects/:id/items
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<i64>,
    ApiJson(item): ApiJson<NewItem>,
) -> Result<(StatusCode, Json<ItemRecord>), ApiError> {
    accessible_project(&state, &auth, project_id).await?;
    item.validate()?;
    let created = state.repos.projects.create_item(project_id, &item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/items/:id
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ApiJson(update): ApiJson<ItemUpdate>,
) -> Result<Json<ItemRecord>, ApiError> {
    accessible_item(&state, &auth, id).await?;
    update.validate()?;
    let updated = state
        .repos
        .projects
        .update_item(id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Item"))?;
    Ok(Json(updated))
}

/// DELETE /api/items/:id
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    accessible_item(&state, &auth, id).await?;
    state.repos.projects.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/items/:id/comments
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<i64>,
) -> Result<Json<Vec<CommentRecord>>, ApiError> {
    accessible_item(&state, &auth, item_id).await?;
    Ok(Json(state.repos.projects.list_comments(item_id).await?))
}

/// POST /api/items/:id/comments
///
/// # Errors
/// Returns `NotFound`, `Forbidden` or `BadRequest`.
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<i64>,
    ApiJson(comment): ApiJson<NewComment>,
) -> Result<(StatusCode, Json<CommentRecord>), ApiError> {
    accessible_item(&state, &auth, item_id).await?;
    comment.validate()?;
    let created = state
        .repos
        .projects
        .create_comment(item_id, auth.id, &comment)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/comments/:id
///
/// Allowed for the comment's author, the project owner, or an admin.
///
/// # Errors
/// Returns `NotFound` or `Forbidden`.
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let comment = state
        .repos
        .projects
        .get_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment"))?;

    if comment.author_id != auth.id {
        accessible_item(&state, &auth, comment.item_id).await?;
    }

    state.repos.projects.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
