use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use fleetstock_core::{BatchId, ItemId};
use fleetstock_infra::InitialStock;
use fleetstock_inventory::IntakeRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::ListBatchesQuery>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger.list_batches(item_id, query.include_deleted).await {
        Ok(batches) => (StatusCode::OK, Json(batches)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

/// Record a delivery for the item in the path.
pub async fn intake(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<InitialStock>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger.intake(body.for_item(item_id)).await {
        Ok(batch) => (StatusCode::CREATED, Json(batch)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn bulk_intake(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Vec<IntakeRequest>>,
) -> axum::response::Response {
    errors::bulk_to_response(services.ledger.bulk_intake(body).await)
}

/// Direct FIFO deduction, outside of any employee request.
pub async fn deduct(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeductRequest>,
) -> axum::response::Response {
    let item_id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger.deduct(item_id, body.quantity).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn remove_expired(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let batch_id: BatchId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.ledger.remove_expired_batch(batch_id).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
