//! Page-level JSON views: the listing dashboard and the item detail page.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use labtrack_inventory::{ExpiryBadge, ExpiryFilter, SortKey};

use crate::app::routes::items::parse_item_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

const EXPIRY_OPTIONS: [ExpiryFilter; 4] = [
    ExpiryFilter::All,
    ExpiryFilter::Expired,
    ExpiryFilter::ExpiringSoon,
    ExpiryFilter::Valid,
];

/// `GET /`: visible rows plus everything needed to render the filter bar.
pub async fn listing(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let (filter, sort) = match query.parse() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let now = Utc::now();
    let listing = services.listing();
    let rows = listing.view(&filter, sort, now);
    let total = listing.rows().len();

    Json(json!({
        "items": dto::items_to_json(&rows, now),
        "count": rows.len(),
        "total": total,
        "filters": {
            "search": filter.search,
            "expiry": filter.expiry.as_str(),
            "location": filter.location,
            "sort": sort.key,
            "order": sort.order,
        },
        "locations": listing.locations(),
        "expiry_options": EXPIRY_OPTIONS.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
        "sort_options": [SortKey::CreatedAt, SortKey::Name, SortKey::ExpiryDate],
        "exports": ["csv", "xlsx", "json"],
    }))
    .into_response()
}

/// `GET /items/:id`: one row, its badge and a prefilled prediction request.
pub async fn item_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_item_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let item = match services.store().get(id).await {
        Ok(item) => item,
        Err(e) => return errors::store_error_to_response(e),
    };

    let now = Utc::now();
    let badge = ExpiryBadge::classify(item.expiry_date, now);
    Json(json!({
        "item": dto::item_to_json(&item, now),
        "badge": badge,
        "prediction": {
            "endpoint": "/api/predictions",
            "input": dto::prediction_input(&item),
        },
    }))
    .into_response()
}
