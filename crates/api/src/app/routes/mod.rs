use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod export;
pub mod items;
pub mod predictions;
pub mod system;
pub mod views;

/// Every route except `/health`; access control is left to the session guard.
pub fn router() -> Router {
    Router::new()
        .route("/", get(views::listing))
        .route("/items/:id", get(views::item_detail))
        .route("/login", get(auth::login_page))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/callback", get(auth::callback))
        .route("/api/whoami", get(system::whoami))
        .route("/api/stream", get(system::stream))
        .route("/api/predictions", post(predictions::predict))
        .route("/api/export/:format", get(export::export))
        .nest("/api/items", items::router())
}
