// ABOUTME: Route-gating middleware: classifies each path and enforces the session it requires.
// ABOUTME: Admin routes need the admin cookie session; dashboard routes need the identity provider session.

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use frameio_core::route::ADMIN_LOGIN_PATH;
use frameio_core::{AdminSession, IdentityClaims, RouteClass};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::app_state::{AppState, SharedState};
use crate::cookies::{admin_token, identity_token};
use crate::error::ApiError;

/// A tower Layer that applies the route policy to every request.
#[derive(Clone)]
pub struct GateLayer {
    state: SharedState,
}

impl GateLayer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateMiddleware {
            inner,
            state: SharedState::clone(&self.state),
        }
    }
}

/// The middleware service produced by [`GateLayer`].
#[derive(Clone)]
pub struct GateMiddleware<S> {
    inner: S,
    state: SharedState,
}

impl<S> Service<Request<Body>> for GateMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let state = SharedState::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let class = state.policy.classify(req.uri().path());

            if class.requires_admin() {
                let jar = CookieJar::from_headers(req.headers());
                match admin_session(&state, &jar).await {
                    Some(session) => {
                        req.extensions_mut().insert(session);
                    }
                    None => {
                        tracing::info!(path = %req.uri().path(), ?class, "admin session required");
                        return Ok(reject_admin(class));
                    }
                }
            } else if class.requires_identity() {
                match identity_claims(&state, req.headers()) {
                    Some(claims) => {
                        req.extensions_mut().insert(claims);
                    }
                    None => {
                        tracing::debug!(path = %req.uri().path(), ?class, "identity session required");
                        return Ok(reject_identity(&state, class, &req));
                    }
                }
            }

            inner.call(req).await
        })
    }
}

/// Validate the admin cookie against the session table.
pub async fn admin_session(state: &AppState, jar: &CookieJar) -> Option<AdminSession> {
    let token = admin_token(jar)?;
    state.sessions.validate(&token).await
}

/// Verify the identity provider session. Without a configured verifier
/// nothing is accepted.
fn identity_claims(state: &AppState, headers: &HeaderMap) -> Option<IdentityClaims> {
    let verifier = state.identity.as_ref()?;
    let token = identity_token(headers)?;
    match verifier.verify(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "identity token rejected");
            None
        }
    }
}

fn reject_admin(class: RouteClass) -> Response<Body> {
    if class.is_api() {
        ApiError::AdminUnauthorized.into_response()
    } else {
        found(ADMIN_LOGIN_PATH)
    }
}

fn reject_identity(state: &AppState, class: RouteClass, req: &Request<Body>) -> Response<Body> {
    if class.is_api() {
        return ApiError::Unauthenticated.into_response();
    }
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    found(&state.sign_in_redirect(path_and_query))
}

/// `302 Found`: browsers follow it with a GET whatever the original method.
fn found(location: &str) -> Response<Body> {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Extractor for the admin session the gate attached to the request.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AdminSession);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSession>()
            .cloned()
            .map(AdminUser)
            .ok_or(ApiError::AdminUnauthorized)
    }
}

/// Extractor for the identity claims the gate attached to the request.
#[derive(Debug, Clone)]
pub struct Identity(pub IdentityClaims);

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaims>()
            .cloned()
            .map(Identity)
            .ok_or(ApiError::Unauthenticated)
    }
}
