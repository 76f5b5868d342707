// ABOUTME: Admin session endpoints: log in with username/password, log out, and inspect the session.
// ABOUTME: Sessions are opaque tokens carried in an HttpOnly cookie and checked against the session table.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use frameio_core::AdminSession;
use serde::{Deserialize, Serialize};

use crate::app_state::{AppState, SharedState};
use crate::cookies::{admin_token, clear_session_cookie, session_cookie};
use crate::error::ApiError;
use crate::gate::admin_session;

/// Request body for the admin login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Check a username/password pair and issue a session on success.
pub async fn attempt_login(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<AdminSession, ApiError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }
    let Some(creds) = state.admin.as_ref() else {
        tracing::warn!("admin login attempted but no admin account is configured");
        return Err(ApiError::AdminDisabled);
    };
    if !creds.verify(username, password) {
        tracing::warn!(username = %username, "admin login failed");
        return Err(ApiError::InvalidCredentials);
    }
    Ok(state.sessions.issue(creds.username()).await)
}

/// `Set-Cookie` header value for a freshly issued session.
pub fn cookie_for(state: &AppState, session: &AdminSession) -> String {
    session_cookie(
        &session.token,
        state.sessions.ttl_secs(),
        state.config.secure_cookies,
    )
}

/// POST /api/admin/auth/login
pub async fn login(
    State(state): State<SharedState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session = attempt_login(&state, &req.username, &req.password).await?;

    let cookie = cookie_for(&state, &session);
    let body = LoginResponse {
        success: true,
        username: session.username,
        expires_at: session.expires_at,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/admin/auth/logout. Idempotent: always clears the cookie.
pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Some(token) = admin_token(&jar) {
        state.sessions.revoke(&token).await;
    }
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Json(serde_json::json!({ "success": true })),
    )
        .into_response()
}

/// GET /api/admin/auth/session
pub async fn session(State(state): State<SharedState>, jar: CookieJar) -> Json<SessionResponse> {
    match admin_session(&state, &jar).await {
        Some(session) => Json(SessionResponse {
            authenticated: true,
            username: Some(session.username),
            expires_at: Some(session.expires_at),
        }),
        None => Json(SessionResponse {
            authenticated: false,
            username: None,
            expires_at: None,
        }),
    }
}
