//! Path-based session guard.
//!
//! Pure decision table: the caller supplies the request path and whether a
//! valid session was found, and maps the decision onto an HTTP response.

/// How a request path is treated by the guard.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable with or without a session.
    Public,
    /// Sign-in pages; a signed-in user is sent home instead.
    AuthPage,
    /// Page that requires a session; anonymous users are sent to sign in.
    ProtectedPage,
    /// JSON endpoint that requires a session; anonymous callers get 401.
    ProtectedApi,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Redirect to `/login?next=<path>`.
    RedirectToLogin { next: String },
    /// Redirect to `/`.
    RedirectHome,
    Unauthorized,
}

impl GuardDecision {
    /// Location header value for redirect decisions.
    pub fn location(&self) -> Option<String> {
        match self {
            GuardDecision::RedirectToLogin { next } => {
                Some(format!("/login?next={}", urlencoding::encode(next)))
            }
            GuardDecision::RedirectHome => Some("/".to_string()),
            GuardDecision::Allow | GuardDecision::Unauthorized => None,
        }
    }
}

pub fn classify(path: &str) -> RouteClass {
    // The callback must stay reachable while it is establishing a session,
    // and logout must work with one.
    if path == "/auth/callback" || path == "/auth/logout" {
        return RouteClass::Public;
    }
    if path == "/login" || path.starts_with("/auth/") {
        return RouteClass::AuthPage;
    }
    if path == "/api" || path.starts_with("/api/") {
        return RouteClass::ProtectedApi;
    }
    if path == "/" || path == "/items" || path.starts_with("/items/") {
        return RouteClass::ProtectedPage;
    }
    RouteClass::Public
}

pub fn decide(path: &str, has_session: bool) -> GuardDecision {
    match (classify(path), has_session) {
        (RouteClass::ProtectedPage, false) => GuardDecision::RedirectToLogin {
            next: path.to_string(),
        },
        (RouteClass::ProtectedApi, false) => GuardDecision::Unauthorized,
        (RouteClass::AuthPage, true) => GuardDecision::RedirectHome,
        _ => GuardDecision::Allow,
    }
}

/// Post-login destination, restricted to local absolute paths.
///
/// Anything else (absent, external, protocol-relative) falls back to `/`.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => {
            n.to_string()
        }
        _ => "/".to_string(),
    }
}
