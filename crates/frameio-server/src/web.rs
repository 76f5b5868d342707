// ABOUTME: Browser-facing admin login page rendered with Askama, plus the form login/logout handlers.
// ABOUTME: Also holds the JSON 404 handler used when no route or static file matches.

use axum::extract::{Form, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use frameio_core::route::{ADMIN_HOME_PATH, ADMIN_LOGIN_PATH};
use serde::Deserialize;

use crate::api::admin_auth::{attempt_login, cookie_for};
use crate::app_state::SharedState;
use crate::cookies::{admin_token, clear_session_cookie};
use crate::error::ApiError;
use crate::gate::admin_session;

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;

/// Admin sign-in form.
#[derive(Template, AskamaIntoResponse)]
#[template(path = "admin_login.html")]
pub struct AdminLoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

/// Form data posted by the admin sign-in page.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /admin/login
pub async fn login_page(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if admin_session(&state, &jar).await.is_some() {
        return Redirect::to(ADMIN_HOME_PATH).into_response();
    }
    AdminLoginTemplate {
        error: None,
        username: String::new(),
    }
    .into_response()
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match attempt_login(&state, &form.username, &form.password).await {
        Ok(session) => {
            tracing::info!(username = %session.username, "admin logged in via form");
            let cookie = cookie_for(&state, &session);
            ([(header::SET_COOKIE, cookie)], Redirect::to(ADMIN_HOME_PATH)).into_response()
        }
        Err(e) => {
            let message = match &e {
                ApiError::BadRequest(_) => "Username and password are required".to_string(),
                other => other.envelope().error,
            };
            let page = AdminLoginTemplate {
                error: Some(message),
                username: form.username.trim().to_string(),
            };
            (e.status(), page).into_response()
        }
    }
}

/// POST /admin/logout
pub async fn logout_submit(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Some(token) = admin_token(&jar) {
        state.sessions.revoke(&token).await;
    }
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Redirect::to(ADMIN_LOGIN_PATH),
    )
        .into_response()
}

/// Fallback for anything no route or static file answers.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
