// ABOUTME: Admin proxy route for platform analytics, forwarded to {backend}/api/admin/analytics/.

use axum::extract::{RawQuery, State};
use axum::response::Response;
use reqwest::Method;

use crate::api::relay;
use crate::app_state::SharedState;
use crate::error::ApiError;
use crate::gate::AdminUser;

const ANALYTICS_PATH: &str = "/api/admin/analytics/";

/// GET /api/admin/analytics. The query string (e.g. `period=30d`) is passed through.
pub async fn get_analytics(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let resp = state
        .backend
        .forward_admin(
            Method::GET,
            ANALYTICS_PATH,
            query.as_deref(),
            None,
            &admin.username,
        )
        .await?;
    relay(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::config::{AdminConfig, AdminSecretConfig, FrameioConfig};
    use crate::routes::create_router;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn state_and_cookie(backend_url: String) -> (SharedState, String) {
        let config = FrameioConfig {
            backend_url,
            admin: Some(AdminConfig {
                username: "ops".to_string(),
                secret: AdminSecretConfig::Plain("pw".to_string()),
            }),
            ..FrameioConfig::default()
        };
        let state = Arc::new(AppState::from_config(config).unwrap());
        let session = state.sessions.issue("ops").await;
        (state, format!("frameio_admin_session={}", session.token))
    }

    #[tokio::test]
    async fn analytics_forwards_period() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/admin/analytics/"))
            .and(query_param("period", "30d"))
            .and(header_is("X-Admin-Request", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_users": 120,
                "posters_generated": 4031
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (state, cookie) = state_and_cookie(server.uri()).await;
        let resp = create_router(state)
            .oneshot(
                Request::get("/api/admin/analytics?period=30d")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total_users"], 120);
    }

    #[tokio::test]
    async fn backend_auth_failure_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Admin authentication failed"
            })))
            .mount(&server)
            .await;

        let (state, cookie) = state_and_cookie(server.uri()).await;
        let resp = create_router(state)
            .oneshot(
                Request::get("/api/admin/analytics")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Admin authentication failed");
    }
}
