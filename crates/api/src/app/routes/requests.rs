use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use fleetstock_core::RequestId;
use fleetstock_inventory::{NewRequest, RequestFilter};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// `GET /requests?item_id=ITEM-00001&status=NOT_RETURNED`
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<RequestFilter>,
) -> axum::response::Response {
    match services.requests.list(&filter).await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewRequest>,
) -> axum::response::Response {
    match services.requests.create(body).await {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn bulk_create(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Vec<NewRequest>>,
) -> axum::response::Response {
    errors::bulk_to_response(services.requests.bulk_create(body).await)
}

pub async fn get(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.requests.get(id).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn mark_returned(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Option<Json<dto::ReturnRequestBody>>,
) -> axum::response::Response {
    let id: RequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = body.map(|Json(b)| b).unwrap_or_default();
    match services.requests.mark_returned(id, body.actual_return_date).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn remove(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RequestId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.requests.soft_delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
