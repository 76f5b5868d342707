// ABOUTME: End-to-end test of the Frameio gateway against a mocked backend.
// ABOUTME: Covers admin login, proxied user management, error forwarding, logout, and identity routes.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::Body;
use frameio_server::config::{AdminConfig, AdminSecretConfig, IdentityKeyConfig};
use frameio_server::{AppState, FrameioConfig, create_router};
use http::{Request, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWT_SECRET: &str = "e2e-identity-secret";

/// Helper to build the full router against a backend URL.
fn gateway(backend_url: String) -> Router {
    let phc = frameio_core::hash_password("hunter2-but-longer").unwrap();
    let config = FrameioConfig {
        public_base_url: "https://app.frameio.test".to_string(),
        backend_url,
        admin: Some(AdminConfig {
            username: "ops".to_string(),
            secret: AdminSecretConfig::Argon2Hash(phc),
        }),
        identity_key: Some(IdentityKeyConfig::SharedSecret(JWT_SECRET.to_string())),
        ..FrameioConfig::default()
    };
    create_router(Arc::new(AppState::from_config(config).unwrap()))
}

/// Helper to extract JSON body from a response.
async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn identity_token(sub: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    encode(
        &Header::new(Algorithm::HS256),
        &serde_json::json!({ "sub": sub, "sid": "sess_1", "exp": now + 600 }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn admin_lifecycle_through_the_gateway() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .and(header_is("X-Admin-Request", "true"))
        .and(header_is("X-Admin-Username", "ops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 2,
            "results": [{ "id": 1 }, { "id": 2 }]
        })))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/2/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": "Cannot delete a staff account",
            "code": "staff_protected"
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let app = gateway(backend.uri());

    // 1. Without a session the admin API is closed.
    let resp = app
        .clone()
        .oneshot(Request::get("/api/admin/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(resp).await;
    assert_eq!(json["error"], "Unauthorized");
    assert!(json["detail"].as_str().unwrap().contains("/admin/login"));

    // 2. Log in against the Argon2-hashed secret.
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/admin/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"username":"ops","password":"hunter2-but-longer"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    // 3. The proxied list carries the admin headers and passes the body through.
    let resp = app
        .clone()
        .oneshot(get("/api/admin/users", &cookie))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["count"], 2);

    // 4. Backend refusals keep their status and message.
    let resp = app
        .clone()
        .oneshot(
            Request::delete("/api/admin/users/2")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json = json_body(resp).await;
    assert_eq!(json["error"], "Cannot delete a staff account");
    assert_eq!(json["detail"]["code"], "staff_protected");

    // 5. Logging out closes the admin API again.
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/admin/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(get("/api/admin/users", &cookie))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(get("/admin", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/admin/login");
}

#[tokio::test]
async fn unreachable_backend_maps_to_503() {
    // Nothing listens on the discard port.
    let app = gateway("http://127.0.0.1:9".to_string());
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/admin/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"username":"ops","password":"hunter2-but-longer"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let resp = app
        .oneshot(get("/api/admin/analytics?period=7d", &cookie))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(resp).await["error"], "Backend service unavailable");
}

#[tokio::test]
async fn identity_session_opens_dashboard_api_but_not_admin() {
    let backend = MockServer::start().await;
    let app = gateway(backend.uri());
    let cookie = format!("__session={}", identity_token("user_9"));

    let resp = app.clone().oneshot(get("/api/me", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["user_id"], "user_9");
    assert_eq!(json["session_id"], "sess_1");

    let resp = app
        .clone()
        .oneshot(get("/api/admin/analytics", &cookie))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A protected page without any session goes to sign-in with a way back.
    let resp = app
        .oneshot(
            Request::get("/poster-generator?draft=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://app.frameio.test/sign-in?redirect_url="));
    assert!(location.contains("poster-generator"));
}
