use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use labtrack_infra::ExportFormat;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `GET /api/export/:format`: the listing as currently filtered, as a file download.
pub async fn export(
    Extension(services): Extension<Arc<AppServices>>,
    Path(format): Path<String>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let format = match format.parse::<ExportFormat>() {
        Ok(f) => f,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_format", msg),
    };
    let (filter, sort) = match query.parse() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let now = Utc::now();
    let rows = services.listing().view(&filter, sort, now);
    let body = match format.encode(&rows) {
        Ok(b) => b,
        Err(e) => return errors::export_error_to_response(e),
    };

    tracing::info!(format = format.extension(), rows = rows.len(), "inventory exported");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.filename(now)),
            ),
        ],
        body,
    )
        .into_response()
}
