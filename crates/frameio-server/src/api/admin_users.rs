// ABOUTME: Admin proxy routes for user management, forwarded to {backend}/api/users/.
// ABOUTME: List, fetch, update (PATCH), and delete users on behalf of the logged-in admin.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::response::Response;
use reqwest::Method;
use serde_json::Value;

use crate::api::relay;
use crate::app_state::SharedState;
use crate::error::ApiError;
use crate::gate::AdminUser;

const USERS_PATH: &str = "/api/users/";

/// User ids are backend primary keys or slugs; anything else never reaches the backend.
fn user_path(id: &str) -> Result<String, ApiError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ApiError::BadRequest(format!("invalid user id: {id:?}")));
    }
    Ok(format!("{USERS_PATH}{id}/"))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let resp = state
        .backend
        .forward_admin(Method::GET, USERS_PATH, query.as_deref(), None, &admin.username)
        .await?;
    relay(resp)
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let path = user_path(&id)?;
    let resp = state
        .backend
        .forward_admin(Method::GET, &path, None, None, &admin.username)
        .await?;
    relay(resp)
}

/// PATCH /api/admin/users/{id}
pub async fn update_user(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let path = user_path(&id)?;
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if !body.is_object() {
        return Err(ApiError::BadRequest(
            "request body must be a JSON object".to_string(),
        ));
    }
    tracing::info!(admin = %admin.username, user_id = %id, "updating user");
    let resp = state
        .backend
        .forward_admin(Method::PATCH, &path, None, Some(&body), &admin.username)
        .await?;
    relay(resp)
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let path = user_path(&id)?;
    tracing::info!(admin = %admin.username, user_id = %id, "deleting user");
    let resp = state
        .backend
        .forward_admin(Method::DELETE, &path, None, None, &admin.username)
        .await?;
    relay(resp)
}
