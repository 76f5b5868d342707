// ABOUTME: API module containing the JSON handlers of the Frameio gateway.
// ABOUTME: Admin session endpoints, admin proxy routes for users and analytics, and the identity endpoint.

pub mod admin_analytics;
pub mod admin_auth;
pub mod admin_users;
pub mod me;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frameio_core::ErrorEnvelope;

use crate::backend::BackendResponse;
use crate::error::ApiError;

/// Turn a backend response into the browser response.
///
/// Success bodies pass through with their status. An empty success body
/// becomes `{"success": true}` (a 204 becomes a 200 so it can carry it).
/// Error statuses are forwarded with the reshaped envelope.
pub(crate) fn relay(resp: BackendResponse) -> Result<Response, ApiError> {
    let status = resp.status;
    if !status.is_success() {
        return Err(ApiError::Backend {
            status,
            envelope: ErrorEnvelope::from_backend(status.as_u16(), &resp.body),
        });
    }

    if resp.body.iter().all(u8::is_ascii_whitespace) {
        let status = if status == StatusCode::NO_CONTENT {
            StatusCode::OK
        } else {
            status
        };
        return Ok((status, Json(serde_json::json!({ "success": true }))).into_response());
    }

    let value: serde_json::Value = serde_json::from_slice(&resp.body)
        .map_err(|e| ApiError::Internal(format!("backend returned a non-JSON body: {e}")))?;
    Ok((status, Json(value)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn backend(status: u16, body: &'static [u8]) -> BackendResponse {
        BackendResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from_static(body),
        }
    }

    async fn json_of(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = relay(backend(201, br#"{"id":3}"#)).unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(json_of(resp).await["id"], 3);
    }

    #[tokio::test]
    async fn no_content_becomes_success_flag() {
        let resp = relay(backend(204, b"")).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_of(resp).await, serde_json::json!({ "success": true }));
    }

    #[test]
    fn error_status_is_forwarded() {
        let err = relay(backend(403, br#"{"detail":"Forbidden"}"#)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.envelope().error, "Forbidden");
    }

    #[test]
    fn non_json_success_is_internal_error() {
        let err = relay(backend(200, b"<html>oops</html>")).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
