use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use clinic_core::{DomainError, MedicineId};
use clinic_infra::MedicineStore;
use clinic_inventory::MedicineUpdate;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route("/bulk", post(bulk_create_medicines))
        .route(
            "/:id",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
        .route("/:id/stock", patch(adjust_stock))
}

/// Unparseable ids cannot name an existing medicine, so they are 404s.
fn parse_id(id: &str) -> Result<MedicineId, axum::response::Response> {
    id.parse::<MedicineId>().map_err(|_| medicine_not_found())
}

fn medicine_not_found() -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "Medicine not found")
}

pub async fn list_medicines(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.medicines().list() {
        Ok(all) => (StatusCode::OK, Json(all)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn get_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.medicines().get(&id) {
        Ok(Some(m)) => (StatusCode::OK, Json(m)).into_response(),
        Ok(None) => medicine_not_found(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn create_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateMedicineRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let fields = match body.into_new_medicine() {
        Ok(f) => f,
        Err(missing) => return errors::domain_error_to_response(DomainError::Validation(missing)),
    };

    match services.medicines().create(fields) {
        Ok(m) => (StatusCode::CREATED, Json(m)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn bulk_create_medicines(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::BulkCreateMedicinesRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let batch = match body.into_new_medicines() {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.medicines().create_many(batch) {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn update_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateMedicineRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.medicines().update(&id, MedicineUpdate::from(body)) {
        Ok(Some(m)) => (StatusCode::OK, Json(m)).into_response(),
        Ok(None) => medicine_not_found(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn delete_medicine(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.medicines().delete(&id) {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Medicine deleted successfully" })),
        )
            .into_response(),
        Ok(false) => medicine_not_found(),
        Err(e) => errors::infra_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::AdjustStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let Json(body) = match payload {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let delta = match body.delta() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.medicines().adjust_stock(&id, delta) {
        Ok(m) => (StatusCode::OK, Json(m)).into_response(),
        Err(e) if matches!(e.domain(), Some(DomainError::NotFound)) => medicine_not_found(),
        Err(e) => errors::infra_error_to_response(e),
    }
}
