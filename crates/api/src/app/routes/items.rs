use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use fleetstock_core::ItemId;
use fleetstock_inventory::ItemPatch;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    let (filter, sort) = query.into_parts();
    match services.catalogue.list_items(&filter, sort).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services.catalogue.create_item(body.item, body.initial_stock).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalogue.get_item(id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalogue.update_item(id, patch).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalogue.delete_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn set_override(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetOverrideRequest>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalogue.set_override(id, body.status).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn clear_override(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.catalogue.clear_override(id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
