// ABOUTME: Admin panel credentials and the in-memory admin session table.
// ABOUTME: Issues opaque random tokens, validates them with expiry, and sweeps stale entries.

use std::collections::HashMap;
use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;

/// Cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "frameio_admin_session";

/// Default admin session lifetime: one day.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

const TOKEN_LEN: usize = 64;

// Ten years. Keeps chrono arithmetic in range for absurd configured values.
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Hash a password with Argon2id, producing a PHC string suitable for
/// `FRAMEIO_ADMIN_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

enum AdminSecret {
    Plain(String),
    Argon2(String),
}

/// The single admin account configured for this deployment.
pub struct AdminCredentials {
    username: String,
    secret: AdminSecret,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.secret {
            AdminSecret::Plain(_) => "plain",
            AdminSecret::Argon2(_) => "argon2",
        };
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("secret", &kind)
            .finish()
    }
}

impl AdminCredentials {
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: AdminSecret::Plain(password.into()),
        }
    }

    /// Credentials backed by an Argon2 PHC string. The hash is parsed up front
    /// so a malformed value fails at startup rather than at first login.
    pub fn hashed(username: impl Into<String>, phc: impl Into<String>) -> Result<Self, CoreError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|e| CoreError::InvalidPasswordHash(e.to_string()))?;
        Ok(Self {
            username: username.into(),
            secret: AdminSecret::Argon2(phc),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a login attempt. Both the username and the secret are always
    /// compared so timing does not reveal which one was wrong.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let secret_ok = match &self.secret {
            AdminSecret::Plain(expected) => {
                constant_time_eq(expected.as_bytes(), password.as_bytes())
            }
            AdminSecret::Argon2(phc) => match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            },
        };
        user_ok & secret_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// An issued admin session.
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    #[serde(skip)]
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory table of live admin sessions keyed by token.
pub struct SessionStore {
    ttl_secs: u64,
    sessions: RwLock<HashMap<String, AdminSession>>,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs: ttl_secs.min(MAX_SESSION_TTL_SECS),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn generate_token() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect()
    }

    /// Issue a fresh session for an already-verified username.
    pub async fn issue(&self, username: &str) -> AdminSession {
        let now = Utc::now();
        let session = AdminSession {
            token: Self::generate_token(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(self.ttl_secs as i64),
        };
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        tracing::info!(username = %username, expires_at = %session.expires_at, "admin session issued");
        session
    }

    /// Look up a token. Expired sessions are evicted and reported as absent.
    pub async fn validate(&self, token: &str) -> Option<AdminSession> {
        if token.is_empty() {
            return None;
        }
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return None,
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
            }
        }
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(token) {
            if session.is_expired(now) {
                tracing::debug!(username = %session.username, "admin session expired");
                sessions.remove(token);
            }
        }
        None
    }

    /// Revoke a token. Returns whether a session was removed.
    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(ref session) = removed {
            tracing::info!(username = %session.username, "admin session revoked");
        }
        removed.is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
