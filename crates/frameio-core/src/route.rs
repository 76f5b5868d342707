// ABOUTME: Route classification for the gateway: which session, if any, a path requires.
// ABOUTME: Parses matcher patterns like "/sign-in(.*)" and evaluates the fixed precedence order.

use std::borrow::Cow;
use std::fmt;

/// Public routes every deployment exposes without a session.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &[
    "/",
    "/sign-in(.*)",
    "/sign-up(.*)",
    "/api/webhooks(.*)",
    "/health",
    "/_next(.*)",
    "/favicon.ico",
    "/assets(.*)",
];

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const ADMIN_LOGOUT_PATH: &str = "/admin/logout";
pub const ADMIN_HOME_PATH: &str = "/admin";

/// A single route matcher.
///
/// A trailing `(.*)` makes the pattern a plain string prefix, so
/// `/sign-in(.*)` matches `/sign-in`, `/sign-in/factor-one` and
/// `/sign-in-legacy` alike. Anything else must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Exact(String),
    Prefix(String),
}

impl RoutePattern {
    /// Parse a matcher string. Surrounding whitespace is ignored.
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        match pattern.strip_suffix("(.*)") {
            Some(prefix) => RoutePattern::Prefix(prefix.to_string()),
            None => RoutePattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(p) => path == p,
            RoutePattern::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Exact(p) => write!(f, "{p}"),
            RoutePattern::Prefix(p) => write!(f, "{p}(.*)"),
        }
    }
}

/// What a request path requires before it reaches a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// The admin login page. Open to everyone.
    AdminLogin,
    /// The admin logout form target. Open to everyone so a stale cookie can
    /// always be cleared.
    AdminLogout,
    /// Admin panel pages. Without an admin session: redirect to the login page.
    AdminPage,
    /// Admin session issue/inspect/revoke endpoints. Open to everyone.
    AdminAuthApi,
    /// Admin proxy routes. Without an admin session: 401.
    AdminApi,
    /// Allow-listed routes. No session required.
    Public,
    /// User-facing API routes. Without an identity session: 401.
    ProtectedApi,
    /// User-facing dashboard pages. Without an identity session: redirect to sign-in.
    ProtectedPage,
}

impl RouteClass {
    pub fn requires_admin(self) -> bool {
        matches!(self, RouteClass::AdminPage | RouteClass::AdminApi)
    }

    pub fn requires_identity(self) -> bool {
        matches!(self, RouteClass::ProtectedApi | RouteClass::ProtectedPage)
    }

    /// Whether a rejection should be a JSON 401 instead of a redirect.
    pub fn is_api(self) -> bool {
        matches!(
            self,
            RouteClass::AdminAuthApi | RouteClass::AdminApi | RouteClass::ProtectedApi
        )
    }
}

/// Ordered route rules plus the public allow-list.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public: Vec<RoutePattern>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl RoutePolicy {
    /// Build a policy from the default allow-list plus `extra` patterns.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut public: Vec<RoutePattern> = DEFAULT_PUBLIC_ROUTES
            .iter()
            .map(|p| RoutePattern::parse(p))
            .collect();
        for pattern in extra {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let parsed = RoutePattern::parse(pattern);
            if !public.contains(&parsed) {
                public.push(parsed);
            }
        }
        Self { public }
    }

    pub fn public_patterns(&self) -> &[RoutePattern] {
        &self.public
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|p| p.matches(path))
    }

    /// Classify a request path. Admin rules win over the allow-list so that
    /// an over-broad public pattern can never expose the admin panel.
    ///
    /// The path is normalised first, so `/%61dmin` and `//admin` classify
    /// the same way the static file server will resolve them.
    pub fn classify(&self, path: &str) -> RouteClass {
        let normalized = normalize_path(path);
        let path = normalized.as_ref();
        if path == ADMIN_LOGIN_PATH {
            return RouteClass::AdminLogin;
        }
        if path == ADMIN_LOGOUT_PATH {
            return RouteClass::AdminLogout;
        }
        if under(path, ADMIN_HOME_PATH) {
            return RouteClass::AdminPage;
        }
        if under(path, "/api/admin/auth") {
            return RouteClass::AdminAuthApi;
        }
        if under(path, "/api/admin") {
            return RouteClass::AdminApi;
        }
        if self.is_public(path) {
            return RouteClass::Public;
        }
        if under(path, "/api") {
            return RouteClass::ProtectedApi;
        }
        RouteClass::ProtectedPage
    }
}

/// Percent-decode a request path and collapse repeated slashes. Invalid
/// escapes are left as-is. Returns the input untouched when nothing changes.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if !path.contains('%') && !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    let decoded = String::from_utf8_lossy(&decoded);
    let mut out = String::with_capacity(decoded.len());
    for c in decoded.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Segment-aware prefix test: `/admin` and `/admin/x` are under `/admin`,
/// `/administrator` is not.
fn under(path: &str, root: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
