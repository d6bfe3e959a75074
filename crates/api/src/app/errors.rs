use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gradeportal_infra::services::{AccountError, ProvisionError};

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::NoRole => json_error(StatusCode::NOT_FOUND, "not_found", "User role not found"),
        AccountError::Provisioning(e) => {
            tracing::warn!(error = %e, "user setup failed");
            match e {
                ProvisionError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
                ProvisionError::RoleConflict { .. } | ProvisionError::RoleWrite(_) => {
                    json_error(StatusCode::BAD_REQUEST, "setup_failed", "Failed to set user role")
                }
                ProvisionError::ProfileWrite { role, .. } => json_error(
                    StatusCode::BAD_REQUEST,
                    "setup_failed",
                    format!("Failed to create {role} profile"),
                ),
            }
        }
        AccountError::Store(e) => {
            tracing::error!(error = %e, "store error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "Internal server error")
        }
    }
}

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

pub fn invalid_body(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_request", message)
}

pub async fn method_not_allowed() -> axum::response::Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Method not allowed")
}
