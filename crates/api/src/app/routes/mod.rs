use axum::{routing::post, Router};

pub mod invoices;
pub mod medicines;
pub mod stock;
pub mod system;

/// Router for every `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/medicines", medicines::router())
        .nest("/invoices", invoices::router())
        .route("/validate-stock", post(stock::validate_stock))
}
