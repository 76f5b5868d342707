// ABOUTME: Verification of the identity provider's session token (a signed JWT).
// ABOUTME: Supports HS256 shared secrets and RS256 PEM public keys, with optional azp checks.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Cookie the identity provider stores its session JWT in.
pub const IDENTITY_COOKIE: &str = "__session";

/// Claims read from a verified identity session token. Organisation fields
/// are only present when the user has an active organisation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_slug: Option<String>,
}

/// Verifies identity session tokens against a configured key.
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("authorized_parties", &self.authorized_parties)
            .finish()
    }
}

impl IdentityVerifier {
    /// Verifier for HS256 tokens signed with a shared secret.
    pub fn hs256(secret: &[u8]) -> Result<Self, CoreError> {
        if secret.is_empty() {
            return Err(CoreError::InvalidIdentityKey("empty shared secret".to_string()));
        }
        Ok(Self::with_key(
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
        ))
    }

    /// Verifier for RS256 tokens, given the provider's PEM-encoded public key.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, CoreError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| CoreError::InvalidIdentityKey(e.to_string()))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 60;
        validation.validate_nbf = true;
        // Session tokens carry `azp`, not `aud`.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key,
            validation,
            authorized_parties: Vec::new(),
        }
    }

    /// Restrict accepted tokens to those whose `azp` is one of `parties`.
    /// An empty list disables the check.
    pub fn with_authorized_parties(mut self, parties: Vec<String>) -> Self {
        self.authorized_parties = parties;
        self
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, CoreError> {
        let data = decode::<IdentityClaims>(token, &self.key, &self.validation)?;
        let claims = data.claims;
        if !self.authorized_parties.is_empty() {
            let allowed = claims
                .azp
                .as_deref()
                .is_some_and(|azp| self.authorized_parties.iter().any(|p| p == azp));
            if !allowed {
                return Err(CoreError::UnauthorizedParty(claims.azp));
            }
        }
        Ok(claims)
    }
}

/// Pull a bearer token out of an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
