use axum::{
    Router,
    routing::{get, post, put},
};

pub mod batches;
pub mod buses;
pub mod categories;
pub mod items;
pub mod requests;
pub mod system;

/// Router for all inventory endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route("/items", get(items::list).post(items::create))
        .route("/items/:id", get(items::get).patch(items::update).delete(items::remove))
        .route("/items/:id/override", put(items::set_override).delete(items::clear_override))
        .route("/items/:id/batches", get(batches::list).post(batches::intake))
        .route("/items/:id/deduct", post(batches::deduct))
        .route("/batches/bulk", post(batches::bulk_intake))
        .route("/batches/:id/expire", post(batches::remove_expired))
        .route("/requests", get(requests::list).post(requests::create))
        .route("/requests/bulk", post(requests::bulk_create))
        .route("/requests/:id", get(requests::get).delete(requests::remove))
        .route("/requests/:id/return", post(requests::mark_returned))
        .route("/buses", get(buses::list).post(buses::register))
}
