// ABOUTME: Configuration loading and validation for the Frameio gateway.
// ABOUTME: Reads FRAMEIO_* environment variables and builds admin credentials and the identity verifier.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use frameio_core::session::DEFAULT_SESSION_TTL_SECS;
use frameio_core::{AdminCredentials, CoreError, IdentityVerifier};
use http::HeaderValue;
use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_SIGN_IN_URL: &str = "/sign-in";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKEND_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FRAMEIO_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("FRAMEIO_CORS_ORIGINS contains an invalid origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("FRAMEIO_ADMIN_USERNAME is set but neither FRAMEIO_ADMIN_PASSWORD nor FRAMEIO_ADMIN_PASSWORD_HASH is")]
    AdminWithoutSecret,

    #[error("an admin password is set but FRAMEIO_ADMIN_USERNAME is not")]
    SecretWithoutAdmin,

    #[error("invalid admin credentials: {0}")]
    AdminCredentials(CoreError),

    #[error("failed to read FRAMEIO_IDENTITY_JWT_PUBLIC_KEY at {path}: {source}")]
    ReadPublicKey {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid identity key: {0}")]
    IdentityKey(CoreError),

    #[error("failed to build backend client: {0}")]
    BackendClient(String),
}

/// The admin account's secret, as configured.
#[derive(Clone)]
pub enum AdminSecretConfig {
    Plain(String),
    Argon2Hash(String),
}

impl std::fmt::Debug for AdminSecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminSecretConfig::Plain(_) => f.write_str("Plain(..)"),
            AdminSecretConfig::Argon2Hash(_) => f.write_str("Argon2Hash(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub secret: AdminSecretConfig,
}

/// Where the identity provider's token signing key comes from.
#[derive(Clone)]
pub enum IdentityKeyConfig {
    SharedSecret(String),
    PublicKeyPem(PathBuf),
}

impl std::fmt::Debug for IdentityKeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKeyConfig::SharedSecret(_) => f.write_str("SharedSecret(..)"),
            IdentityKeyConfig::PublicKeyPem(path) => {
                f.debug_tuple("PublicKeyPem").field(path).finish()
            }
        }
    }
}

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct FrameioConfig {
    pub bind: SocketAddr,
    pub public_base_url: String,
    pub backend_url: String,
    pub backend_timeout: Duration,
    pub backend_max_response_bytes: usize,
    pub admin: Option<AdminConfig>,
    pub admin_session_ttl_secs: u64,
    pub secure_cookies: bool,
    pub identity_key: Option<IdentityKeyConfig>,
    pub authorized_parties: Vec<String>,
    pub sign_in_url: String,
    pub extra_public_routes: Vec<String>,
    pub static_dir: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

impl Default for FrameioConfig {
    fn default() -> Self {
        let bind: SocketAddr = ([127, 0, 0, 1], 3000).into();
        Self {
            bind,
            public_base_url: format!("http://{bind}"),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            backend_max_response_bytes: DEFAULT_BACKEND_MAX_RESPONSE_BYTES,
            admin: None,
            admin_session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            secure_cookies: false,
            identity_key: None,
            authorized_parties: Vec::new(),
            sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
            extra_public_routes: Vec::new(),
            static_dir: None,
            cors_origins: Vec::new(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn flag(name: &str) -> bool {
    var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn list(name: &str) -> Vec<String> {
    var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// A positive integer variable. Zero is rejected like any other bad value.
fn number<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let Some(value) = var(name) else {
        return Ok(default);
    };
    match value.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var: name, value }),
    }
}

fn checked_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: value.clone(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl { var, value });
    }
    Ok(value.trim_end_matches('/').to_string())
}

impl FrameioConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - FRAMEIO_BIND: socket address to bind (default: 127.0.0.1:3000)
    /// - FRAMEIO_PUBLIC_BASE_URL: absolute origin browsers use (default: http://<bind>)
    /// - FRAMEIO_BACKEND_URL: backend API base URL (default: http://localhost:8000)
    /// - FRAMEIO_BACKEND_TIMEOUT_SECS: per-request backend timeout (default: 30)
    /// - FRAMEIO_BACKEND_MAX_RESPONSE_BYTES: backend body cap (default: 10 MiB)
    /// - FRAMEIO_ADMIN_USERNAME / FRAMEIO_ADMIN_PASSWORD / FRAMEIO_ADMIN_PASSWORD_HASH
    /// - FRAMEIO_ADMIN_SESSION_TTL_SECS: admin session lifetime (default: 86400)
    /// - FRAMEIO_SECURE_COOKIES: mark cookies Secure (default: false)
    /// - FRAMEIO_IDENTITY_JWT_SECRET / FRAMEIO_IDENTITY_JWT_PUBLIC_KEY (PEM path)
    /// - FRAMEIO_IDENTITY_AUTHORIZED_PARTIES: comma-separated azp allow-list
    /// - FRAMEIO_SIGN_IN_URL: identity provider sign-in page (default: /sign-in)
    /// - FRAMEIO_PUBLIC_ROUTES: extra public route patterns, comma-separated
    /// - FRAMEIO_STATIC_DIR: pre-built page bundle to serve
    /// - FRAMEIO_CORS_ORIGINS: comma-separated allowed origins
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = match var("FRAMEIO_BIND") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidBind(s))?,
            None => DEFAULT_BIND
                .parse()
                .map_err(|_| ConfigError::InvalidBind(DEFAULT_BIND.to_string()))?,
        };

        let public_base_url = match var("FRAMEIO_PUBLIC_BASE_URL") {
            Some(url) => checked_url("FRAMEIO_PUBLIC_BASE_URL", url)?,
            None => format!("http://{bind}"),
        };

        let backend_url = checked_url(
            "FRAMEIO_BACKEND_URL",
            var("FRAMEIO_BACKEND_URL").unwrap_or(defaults.backend_url),
        )?;

        let backend_timeout = Duration::from_secs(number(
            "FRAMEIO_BACKEND_TIMEOUT_SECS",
            DEFAULT_BACKEND_TIMEOUT_SECS,
        )?);
        let backend_max_response_bytes = number(
            "FRAMEIO_BACKEND_MAX_RESPONSE_BYTES",
            DEFAULT_BACKEND_MAX_RESPONSE_BYTES,
        )?;

        let username = var("FRAMEIO_ADMIN_USERNAME");
        let secret = var("FRAMEIO_ADMIN_PASSWORD_HASH")
            .map(AdminSecretConfig::Argon2Hash)
            .or_else(|| var("FRAMEIO_ADMIN_PASSWORD").map(AdminSecretConfig::Plain));
        let admin = match (username, secret) {
            (Some(username), Some(secret)) => Some(AdminConfig { username, secret }),
            (Some(_), None) => return Err(ConfigError::AdminWithoutSecret),
            (None, Some(_)) => return Err(ConfigError::SecretWithoutAdmin),
            (None, None) => None,
        };

        let admin_session_ttl_secs =
            number("FRAMEIO_ADMIN_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        let identity_key = var("FRAMEIO_IDENTITY_JWT_PUBLIC_KEY")
            .map(|p| IdentityKeyConfig::PublicKeyPem(PathBuf::from(p)))
            .or_else(|| var("FRAMEIO_IDENTITY_JWT_SECRET").map(IdentityKeyConfig::SharedSecret));

        let cors_origins = list("FRAMEIO_CORS_ORIGINS");
        for origin in &cors_origins {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidCorsOrigin(origin.clone()))?;
        }

        Ok(Self {
            bind,
            public_base_url,
            backend_url,
            backend_timeout,
            backend_max_response_bytes,
            admin,
            admin_session_ttl_secs,
            secure_cookies: flag("FRAMEIO_SECURE_COOKIES"),
            identity_key,
            authorized_parties: list("FRAMEIO_IDENTITY_AUTHORIZED_PARTIES"),
            sign_in_url: var("FRAMEIO_SIGN_IN_URL").unwrap_or(defaults.sign_in_url),
            extra_public_routes: list("FRAMEIO_PUBLIC_ROUTES"),
            static_dir: var("FRAMEIO_STATIC_DIR").map(PathBuf::from),
            cors_origins,
        })
    }

    /// Override the bind address. A public base URL that was derived from the
    /// old bind address follows it.
    pub fn set_bind(&mut self, bind: SocketAddr) {
        if self.public_base_url == format!("http://{}", self.bind) {
            self.public_base_url = format!("http://{bind}");
        }
        self.bind = bind;
    }

    /// Override the backend base URL, with the same checks as `FRAMEIO_BACKEND_URL`.
    pub fn set_backend_url(&mut self, url: String) -> Result<(), ConfigError> {
        self.backend_url = checked_url("FRAMEIO_BACKEND_URL", url)?;
        Ok(())
    }

    pub fn admin_credentials(&self) -> Result<Option<AdminCredentials>, ConfigError> {
        let Some(admin) = &self.admin else {
            return Ok(None);
        };
        let creds = match &admin.secret {
            AdminSecretConfig::Plain(password) => {
                AdminCredentials::plain(admin.username.clone(), password.clone())
            }
            AdminSecretConfig::Argon2Hash(phc) => {
                AdminCredentials::hashed(admin.username.clone(), phc.clone())
                    .map_err(ConfigError::AdminCredentials)?
            }
        };
        Ok(Some(creds))
    }

    pub fn identity_verifier(&self) -> Result<Option<IdentityVerifier>, ConfigError> {
        let verifier = match &self.identity_key {
            None => return Ok(None),
            Some(IdentityKeyConfig::SharedSecret(secret)) => {
                IdentityVerifier::hs256(secret.as_bytes()).map_err(ConfigError::IdentityKey)?
            }
            Some(IdentityKeyConfig::PublicKeyPem(path)) => {
                let pem = std::fs::read(path).map_err(|source| ConfigError::ReadPublicKey {
                    path: path.clone(),
                    source,
                })?;
                IdentityVerifier::rs256_pem(&pem).map_err(ConfigError::IdentityKey)?
            }
        };
        Ok(Some(
            verifier.with_authorized_parties(self.authorized_parties.clone()),
        ))
    }
}
