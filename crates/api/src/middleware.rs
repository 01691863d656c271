use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use labtrack_auth::{GuardDecision, JwtValidator, decide};

use crate::app::errors::json_error;
use crate::context::SessionContext;

/// Cookie carrying the access token of a browser session.
pub const SESSION_COOKIE: &str = "sb-access-token";

#[derive(Clone)]
pub struct SessionState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Route guard for every request.
///
/// A token is read from the session cookie or a bearer header. An invalid or
/// expired token counts as no session. Allowed requests that carry a valid
/// token get a [`SessionContext`] extension.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = session_token(req.headers()).and_then(|token| {
        match state.jwt.validate(&token, Utc::now()) {
            Ok(claims) => Some(SessionContext::new(claims)),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid session token");
                None
            }
        }
    });

    let path = req.uri().path().to_string();
    match decide(&path, session.is_some()) {
        GuardDecision::Allow => {
            if let Some(session) = session {
                req.extensions_mut().insert(session);
            }
            next.run(req).await
        }
        GuardDecision::Unauthorized => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        redirect => match redirect.location() {
            Some(location) => Redirect::to(&location).into_response(),
            None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        },
    }
}

/// Session cookie first, then `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    extract_bearer(headers).map(str::to_string)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
