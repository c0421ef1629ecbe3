use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use clinic_infra::validate_stock as check_stock;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Read-only pre-check of a cart. Always 200 when the body is well formed,
/// `valid` tells the client whether every line can be served.
pub async fn validate_stock(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::ValidateStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let requests = match body.stock_requests() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match check_stock(services.medicines(), &requests) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}
