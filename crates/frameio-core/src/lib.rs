// ABOUTME: Core library for the Frameio gateway: route policy, sessions, identity, and error envelopes.
// ABOUTME: Holds no HTTP server code so the rules can be tested without a running router.

pub mod envelope;
pub mod error;
pub mod identity;
pub mod route;
pub mod session;

pub use envelope::ErrorEnvelope;
pub use error::CoreError;
pub use identity::{IdentityClaims, IdentityVerifier};
pub use route::{RouteClass, RoutePattern, RoutePolicy};
pub use session::{AdminCredentials, AdminSession, SessionStore, hash_password};
