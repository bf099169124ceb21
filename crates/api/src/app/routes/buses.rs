use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use fleetstock_inventory::NewBus;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalogue.list_buses().await {
        Ok(buses) => (StatusCode::OK, Json(buses)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

/// Register a bus; linking it to an item raises that item's external count.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewBus>,
) -> axum::response::Response {
    match services.catalogue.register_bus(body).await {
        Ok(bus) => (StatusCode::CREATED, Json(bus)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
