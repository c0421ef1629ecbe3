use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use clinic_core::InvoiceId;
use clinic_infra::InvoiceStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/:id", get(get_invoice))
}

fn invoice_not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "Invoice not found")
}

/// Runs the full creation workflow: validate stock, deduct, persist.
pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateInvoiceRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let submission = match body.into_new_invoice() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.workflow().create_invoice(submission) {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.invoices().list() {
        Ok(all) => (StatusCode::OK, Json(all)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return invoice_not_found(),
    };

    match services.invoices().get(&id) {
        Ok(Some(invoice)) => (StatusCode::OK, Json(invoice)).into_response(),
        Ok(None) => invoice_not_found(),
        Err(e) => errors::infra_error_to_response(e),
    }
}
