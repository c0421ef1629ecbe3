use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use clinic_core::DomainError;
use clinic_infra::InfraError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(fields) => json_error_with_details(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "Validation failed",
            fields,
        ),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InsufficientStock(lines) => json_error_with_details(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            "Insufficient stock",
            lines,
        ),
        DomainError::InvariantViolation(msg) => internal_error(msg),
    }
}

pub fn infra_error_to_response(err: InfraError) -> axum::response::Response {
    match err {
        InfraError::Domain(e) => domain_error_to_response(e),
        InfraError::Unavailable(msg) => internal_error(msg),
    }
}

/// Body that failed to parse as the expected JSON shape.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        rejection.body_text(),
    )
}

/// Log the detail and answer with a generic 500.
pub fn internal_error(detail: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!(error = %detail, "internal error");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
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

pub fn json_error_with_details<D: Serialize>(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    details: D,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "details": details,
        })),
    )
        .into_response()
}
