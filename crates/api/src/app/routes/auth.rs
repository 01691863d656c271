//! Sign-in, sign-out and the session callback.
//!
//! The browser session is a single HTTP-only cookie holding the access token
//! issued by the auth service; the session middleware validates it on every
//! request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde_json::json;

use labtrack_auth::safe_next;
use labtrack_infra::external::AuthClientError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::{SESSION_COOKIE, session_token};

const CALLBACK_FAILED: &str = "/login?error=auth_callback_failed";

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// `GET /login`
pub async fn login_page(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::NextQuery>,
) -> axum::response::Response {
    Json(json!({
        "next": safe_next(query.next.as_deref()),
        "error": query.error,
        "password_login": services.auth_client().is_some(),
        "login_endpoint": "/auth/login",
    }))
    .into_response()
}

/// `POST /auth/login`
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    if body.email.trim().is_empty() || body.password.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "email and password are required",
        );
    }

    let Some(client) = services.auth_client() else {
        return errors::auth_error_to_response(AuthClientError::NotConfigured);
    };
    let session = match client.sign_in_with_password(body.email.trim(), &body.password).await {
        Ok(s) => s,
        Err(e) => return errors::auth_error_to_response(e),
    };

    tracing::info!("password sign-in succeeded");
    let redirect_to = safe_next(body.next.as_deref());
    (
        jar.add(session_cookie(session.access_token)),
        Json(json!({
            "redirect_to": redirect_to,
            "expires_in": session.expires_in,
        })),
    )
        .into_response()
}

/// `POST /auth/logout`: always clears the cookie; remote sign-out is best effort.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> axum::response::Response {
    if let (Some(client), Some(token)) = (services.auth_client(), session_token(&headers)) {
        if let Err(e) = client.sign_out(&token).await {
            tracing::warn!(error = %e, "remote sign-out failed");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

/// `GET /auth/callback?access_token=..&next=..`
///
/// Accepts a token issued by the auth service (e.g. after a hosted sign-in),
/// stores it as the session cookie and forwards to `next`.
pub async fn callback(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Query(query): Query<dto::CallbackQuery>,
) -> axum::response::Response {
    let Some(token) = query.access_token.filter(|t| !t.trim().is_empty()) else {
        return Redirect::to(CALLBACK_FAILED).into_response();
    };

    if let Err(e) = services.jwt().validate(&token, Utc::now()) {
        tracing::warn!(error = %e, "rejected callback token");
        return Redirect::to(CALLBACK_FAILED).into_response();
    }

    let next = safe_next(query.next.as_deref());
    (jar.add(session_cookie(token)), Redirect::to(&next)).into_response()
}
