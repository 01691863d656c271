use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use labtrack_ai::AiError;
use labtrack_core::DomainError;
use labtrack_infra::StoreError;
use labtrack_infra::export::ExportError;
use labtrack_infra::external::AuthClientError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("item {id} not found"),
        ),
        StoreError::Backend(msg) | StoreError::Decode(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

/// Incomplete input is the caller's fault; every other predictor failure is
/// reported as a server error carrying the predictor's message.
pub fn ai_error_to_response(err: AiError) -> axum::response::Response {
    match err {
        AiError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AiError::Configuration(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", msg)
        }
        AiError::Request(_) | AiError::InvalidResponse(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "prediction_failed",
            err.to_string(),
        ),
    }
}

pub fn export_error_to_response(err: ExportError) -> axum::response::Response {
    tracing::error!(error = %err, "export failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "export_failed", err.to_string())
}

pub fn auth_error_to_response(err: AuthClientError) -> axum::response::Response {
    match err {
        AuthClientError::NotConfigured => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "auth_unavailable",
            err.to_string(),
        ),
        AuthClientError::InvalidCredentials(msg) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", msg)
        }
        AuthClientError::Http(_) | AuthClientError::Api { .. } => {
            tracing::warn!(error = %err, "auth service call failed");
            json_error(StatusCode::BAD_GATEWAY, "auth_service_error", err.to_string())
        }
    }
}
