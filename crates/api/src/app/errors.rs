use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use gasflow_core::DomainError;

/// Map a domain failure to a consistent JSON error response.
///
/// Stock failures keep their structured `{cylinderTypeId, needed, available}`
/// detail so the UI can render precise shortage information.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::StateTransition(msg) => {
            json_error(StatusCode::CONFLICT, "state_transition_error", msg)
        }
        DomainError::InsufficientInventory {
            cylinder_type_id,
            needed,
            available,
        } => stock_error("insufficient_inventory", err.to_string(), cylinder_type_id, needed, available),
        DomainError::InsufficientCustomerStock {
            cylinder_type_id,
            needed,
            available,
        } => stock_error(
            "insufficient_customer_stock",
            err.to_string(),
            cylinder_type_id,
            needed,
            available,
        ),
    }
}

fn stock_error(
    code: &'static str,
    message: String,
    cylinder_type_id: gasflow_core::CylinderTypeId,
    needed: i64,
    available: i64,
) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(json!({
            "error": code,
            "message": message,
            "detail": {
                "cylinderTypeId": cylinder_type_id.to_string(),
                "needed": needed,
                "available": available,
            },
        })),
    )
        .into_response()
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
