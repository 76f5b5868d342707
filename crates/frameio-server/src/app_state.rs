// ABOUTME: Shared application state for the Frameio gateway.
// ABOUTME: Bundles config, route policy, admin sessions, identity verifier, and the backend client.

use std::sync::Arc;

use frameio_core::route::normalize_path;
use frameio_core::{AdminCredentials, IdentityVerifier, RoutePolicy, SessionStore};
use reqwest::Url;

use crate::backend::BackendClient;
use crate::config::{ConfigError, FrameioConfig};

/// Shared application state accessible by all Axum handlers and the gate.
pub struct AppState {
    pub config: FrameioConfig,
    pub policy: RoutePolicy,
    pub sessions: SessionStore,
    pub admin: Option<AdminCredentials>,
    pub identity: Option<IdentityVerifier>,
    pub backend: BackendClient,
    /// Parsed `public_base_url`, the origin `redirect_url` values are built on.
    pub public_base: Url,
    /// Absolute sign-in page URL, resolved against `public_base`.
    pub sign_in: Url,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build the state from a loaded configuration. Fails on anything that
    /// would otherwise only surface on the first request.
    pub fn from_config(config: FrameioConfig) -> Result<Self, ConfigError> {
        let admin = config.admin_credentials()?;
        let identity = config.identity_verifier()?;

        let public_base =
            Url::parse(&config.public_base_url).map_err(|_| ConfigError::InvalidUrl {
                var: "FRAMEIO_PUBLIC_BASE_URL",
                value: config.public_base_url.clone(),
            })?;
        let sign_in = public_base
            .join(&config.sign_in_url)
            .map_err(|_| ConfigError::InvalidUrl {
                var: "FRAMEIO_SIGN_IN_URL",
                value: config.sign_in_url.clone(),
            })?;

        let backend = BackendClient::new(
            config.backend_url.clone(),
            config.backend_timeout,
            config.backend_max_response_bytes,
        )
        .map_err(|e| ConfigError::BackendClient(e.to_string()))?;

        Ok(Self {
            policy: RoutePolicy::new(&config.extra_public_routes),
            sessions: SessionStore::new(config.admin_session_ttl_secs),
            admin,
            identity,
            backend,
            public_base,
            sign_in,
            config,
        })
    }

    /// Absolute sign-in URL carrying `redirect_url` back to `path_and_query`.
    /// The target always stays on `public_base`: only its path and query are
    /// replaced, so a request path like `//other.host/x` cannot name a host.
    pub fn sign_in_redirect(&self, path_and_query: &str) -> String {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        let path = normalize_path(path);
        let path = if path.starts_with('/') {
            path.into_owned()
        } else {
            format!("/{path}")
        };

        let mut target = self.public_base.clone();
        target.set_path(&path);
        target.set_query(query.filter(|q| !q.is_empty()));
        target.set_fragment(None);

        let mut url = self.sign_in.clone();
        url.query_pairs_mut()
            .append_pair("redirect_url", target.as_str());
        url.into()
    }
}
