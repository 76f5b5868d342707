// ABOUTME: HTTP client for the Django backend API used by the admin proxy routes.
// ABOUTME: One forward per call: no retries. Failures are classified and bodies are read with a size cap.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};
use ulid::Ulid;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a single backend round trip.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build backend client: {0}")]
    Client(String),

    #[error("backend unreachable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("backend at {url} did not respond within {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("backend response too large: {size} bytes exceeds {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("backend request failed: {0}")]
    Request(String),
}

impl BackendError {
    /// Whether the browser should be told the backend is down (503).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable { .. } | BackendError::Timeout { .. }
        )
    }
}

/// Status and raw body of a backend response.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Shared client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            max_response_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the absolute backend URL for `path` plus an already-encoded query.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        url
    }

    /// Forward one admin request to the backend, tagged with the admin
    /// headers the backend uses to authorise it.
    pub async fn forward_admin(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
        admin_username: &str,
    ) -> Result<BackendResponse, BackendError> {
        let request_id = Ulid::new().to_string();
        let url = self.url_for(path, query);
        debug!(
            request_id = %request_id,
            method = %method,
            url = %url,
            admin = %admin_username,
            "forwarding admin request to backend"
        );

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("X-Admin-Request", "true")
            .header("X-Admin-Username", admin_username)
            .header("X-Request-Id", &request_id)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify_error(e, &request_id))?;
        let status = response.status();
        let body = self.read_body_limited(response, &request_id).await?;

        if status.is_success() {
            debug!(request_id = %request_id, status = status.as_u16(), "backend responded");
        } else {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = status.as_u16(),
                "backend returned an error status"
            );
        }

        Ok(BackendResponse { status, body })
    }

    /// Read the response body, rejecting anything over `max_response_bytes`.
    async fn read_body_limited(
        &self,
        mut response: reqwest::Response,
        request_id: &str,
    ) -> Result<Bytes, BackendError> {
        let limit = self.max_response_bytes;

        if let Some(len) = response.content_length() {
            if len as usize > limit {
                warn!(
                    request_id = %request_id,
                    content_length = len,
                    limit,
                    "backend response exceeds size limit (Content-Length)"
                );
                return Err(BackendError::TooLarge {
                    size: len as usize,
                    limit,
                });
            }
        }

        let mut buf = Vec::with_capacity(
            response
                .content_length()
                .map(|len| len as usize)
                .unwrap_or(8192)
                .min(limit),
        );
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.classify_error(e, request_id))?
        {
            if buf.len() + chunk.len() > limit {
                warn!(
                    request_id = %request_id,
                    accumulated = buf.len(),
                    limit,
                    "backend response exceeds size limit while streaming"
                );
                return Err(BackendError::TooLarge {
                    size: buf.len() + chunk.len(),
                    limit,
                });
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(buf.into())
    }

    fn classify_error(&self, error: reqwest::Error, request_id: &str) -> BackendError {
        if error.is_timeout() {
            warn!(
                request_id = %request_id,
                timeout_secs = self.timeout.as_secs(),
                "backend request timed out"
            );
            BackendError::Timeout {
                url: self.base_url.clone(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            warn!(request_id = %request_id, url = %self.base_url, "failed to connect to backend");
            BackendError::Unavailable {
                url: self.base_url.clone(),
                reason: error.to_string(),
            }
        } else {
            error!(request_id = %request_id, error = %error, "backend request failed");
            BackendError::Request(error.to_string())
        }
    }
}
