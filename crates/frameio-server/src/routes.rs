// ABOUTME: Route definitions for the Frameio gateway.
// ABOUTME: Assembles API, admin page, and static bundle routes behind the gate, CORS, and tracing layers.

use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::gate::GateLayer;
use crate::web;

/// Build the complete Axum router with all routes, the gate, and shared state.
pub fn create_router(state: SharedState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/me", get(api::me::me))
        .route("/api/admin/auth/login", post(api::admin_auth::login))
        .route("/api/admin/auth/logout", post(api::admin_auth::logout))
        .route("/api/admin/auth/session", get(api::admin_auth::session))
        .route("/api/admin/users", get(api::admin_users::list_users))
        .route(
            "/api/admin/users/{id}",
            get(api::admin_users::get_user)
                .patch(api::admin_users::update_user)
                .delete(api::admin_users::delete_user),
        )
        .route("/api/admin/analytics", get(api::admin_analytics::get_analytics))
        .route(
            "/admin/login",
            get(web::login_page).post(web::login_submit),
        )
        .route("/admin/logout", post(web::logout_submit));

    let router = match &state.config.static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .not_found_service(web::not_found.into_service()),
        ),
        None => router.fallback(web::not_found),
    };

    let router = router
        .with_state(SharedState::clone(&state))
        .layer(GateLayer::new(SharedState::clone(&state)));

    let router = match cors_layer(&state.config.cors_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Credentialed CORS for the configured origins, or none at all.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true),
    )
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::config::FrameioConfig;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state_with(config: FrameioConfig) -> SharedState {
        Arc::new(AppState::from_config(config).unwrap())
    }

    async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = create_router(state_with(FrameioConfig::default()));
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_public_path_without_bundle_is_json_404() {
        let app = create_router(state_with(FrameioConfig::default()));
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn serves_page_bundle_with_json_404_for_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Frameio</h1>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets").join("app.js"), "console.log(1)").unwrap();

        let state = state_with(FrameioConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..FrameioConfig::default()
        });

        let resp = create_router(Arc::clone(&state))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, b"<h1>Frameio</h1>");

        let resp = create_router(Arc::clone(&state))
            .oneshot(Request::get("/assets/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = create_router(state)
            .oneshot(Request::get("/assets/missing.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(json["error"], "Not found");
    }

    #[tokio::test]
    async fn protected_bundle_page_is_gated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("dashboard")).unwrap();
        std::fs::write(dir.path().join("dashboard").join("index.html"), "secret").unwrap();

        let state = state_with(FrameioConfig {
            static_dir: Some(dir.path().to_path_buf()),
            ..FrameioConfig::default()
        });
        let resp = create_router(state)
            .oneshot(Request::get("/dashboard/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_with_credentials() {
        let state = state_with(FrameioConfig {
            cors_origins: vec!["https://studio.frameio.test".to_string()],
            ..FrameioConfig::default()
        });
        let resp = create_router(state)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "https://studio.frameio.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://studio.frameio.test"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn no_origins_means_no_cors_layer() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["https://a.test".to_string()]).is_some());
    }
}
