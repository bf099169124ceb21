use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use fleetstock_core::PrefixedId;
use fleetstock_infra::{BulkReport, InventoryError};

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    let code = err.code();
    match err {
        InventoryError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        InventoryError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, code, format!("{msg} not found")),
        InventoryError::InsufficientStock { requested, available } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": code,
                "message": format!("requested {requested}, only {available} usable in stock"),
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        InventoryError::NotExpired(batch) => json_error(
            StatusCode::CONFLICT,
            code,
            format!("batch {batch} has not reached its expiration date"),
        ),
        InventoryError::InvalidTransition(msg) | InventoryError::Conflict(msg) => {
            json_error(StatusCode::CONFLICT, code, msg)
        }
        InventoryError::Store(msg) => {
            tracing::error!("storage failure: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "storage failure")
        }
    }
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

pub fn parse_id<T: PrefixedId>(raw: &str) -> Result<T, axum::response::Response> {
    raw.parse::<T>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

/// 201 when every entry went through, 207 with an aggregate warning otherwise.
pub fn bulk_to_response<T: Serialize>(report: BulkReport<T>) -> axum::response::Response {
    let status = if report.has_failures() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::CREATED
    };
    (
        status,
        axum::Json(json!({
            "warning": report.warning(),
            "succeeded": report.succeeded,
            "failures": report.failures,
        })),
    )
        .into_response()
}
