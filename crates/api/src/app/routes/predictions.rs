use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    response::IntoResponse,
};

use labtrack_ai::PredictionInput;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `POST /api/predictions`
pub async fn predict(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<PredictionInput>, JsonRejection>,
) -> axum::response::Response {
    let input = match dto::json_body(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };

    let predictor = services.predictor();
    match predictor.predict(&input).await {
        Ok(prediction) => {
            tracing::info!(
                backend = predictor.name(),
                risk = prediction.risk_level.as_str(),
                "expiry predicted"
            );
            Json(dto::prediction_to_json(&prediction)).into_response()
        }
        Err(e) => {
            tracing::warn!(backend = predictor.name(), error = %e, "prediction failed");
            errors::ai_error_to_response(e)
        }
    }
}
