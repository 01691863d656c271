//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, live listing, predictor and auth client wiring
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use labtrack_infra::Config;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub async fn build_app(config: Config) -> anyhow::Result<Router> {
    let services = services::build_services(&config)
        .await
        .context("failed to initialise services")?;
    let session_state = middleware::SessionState {
        jwt: services.jwt(),
    };
    let services = Arc::new(services);

    // The guard sees every path: it also bounces signed-in users off /login.
    let guarded = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            session_state,
            middleware::session_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(guarded)
        .layer(ServiceBuilder::new()))
}
