// ABOUTME: GET /api/me returns the signed-in user's identity and active organisation role.

use axum::Json;
use serde::Serialize;

use crate::gate::Identity;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_slug: Option<String>,
}

pub async fn me(Identity(claims): Identity) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: claims.sub,
        session_id: claims.sid,
        org_id: claims.org_id,
        org_role: claims.org_role,
        org_slug: claims.org_slug,
    })
}
