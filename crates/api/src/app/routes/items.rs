use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use labtrack_core::ItemId;
use labtrack_infra::ItemChange;
use labtrack_inventory::ItemForm;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub fn parse_item_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse::<ItemId>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"))
}

/// Filtered, sorted rows of the live listing.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let (filter, sort) = match query.parse() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let now = Utc::now();
    let rows = services.listing().view(&filter, sort, now);
    Json(dto::items_to_json(&rows, now)).into_response()
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ItemForm>, JsonRejection>,
) -> axum::response::Response {
    let form = match dto::json_body(body) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let draft = match form.validate() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let item = match services.store().insert(draft).await {
        Ok(item) => item,
        Err(e) => return errors::store_error_to_response(e),
    };
    services
        .listing()
        .apply(&ItemChange::Inserted { item: item.clone() });

    tracing::info!(item_id = %item.id, "item created");
    (StatusCode::CREATED, Json(dto::item_to_json(&item, Utc::now()))).into_response()
}

/// Reads from the store, not the listing, so a just-written row is always visible.
pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store().get(id).await {
        Ok(item) => Json(dto::item_to_json(&item, Utc::now())).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ItemForm>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let draft = match dto::json_body(body).and_then(|form| {
        form.validate().map_err(errors::domain_error_to_response)
    }) {
        Ok(d) => d,
        Err(resp) => return resp,
    };

    let item = match services.store().update(id, draft).await {
        Ok(item) => item,
        Err(e) => return errors::store_error_to_response(e),
    };
    services
        .listing()
        .apply(&ItemChange::Updated { item: item.clone() });

    tracing::info!(item_id = %item.id, "item updated");
    Json(dto::item_to_json(&item, Utc::now())).into_response()
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    if let Err(e) = services.store().delete(id).await {
        return errors::store_error_to_response(e);
    }
    services.listing().apply(&ItemChange::Deleted { id });

    tracing::info!(item_id = %id, "item deleted");
    StatusCode::NO_CONTENT.into_response()
}
