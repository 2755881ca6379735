use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use gasflow_core::{ExchangeId, OrderId};
use gasflow_exchange::ReturnDestination;
use gasflow_infra::RecordExchangeInput;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/record", post(record_exchange))
        .route("/tracking", get(list_tracking))
        .route("/:id/acknowledge", post(acknowledge))
}

pub async fn record_exchange(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordExchangeBody>,
) -> axum::response::Response {
    let return_destination = match body.return_destination.as_deref() {
        None | Some("YARD") => ReturnDestination::Yard,
        Some("VEHICLE") => ReturnDestination::Vehicle,
        Some(other) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("unknown return destination '{other}' (expected YARD or VEHICLE)"),
            )
        }
    };

    let input = RecordExchangeInput {
        order_id: OrderId::from_uuid(body.order_id),
        filled_delivered: body.filled_delivered,
        empty_collected: body.empty_collected,
        expected_empty: body.expected_empty,
        variance_reason: body.variance_reason,
        customer_acknowledged: body.customer_acknowledged,
        notes: body.notes,
        return_destination,
        actor: body.actor.unwrap_or_else(|| "api".to_string()),
    };

    match services.exchanges.record_exchange(input) {
        Ok(recorded) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "exchange": dto::ExchangeTrackingDto::from(recorded.exchange),
                "movements": recorded
                    .movements
                    .into_iter()
                    .map(dto::MovementDto::from)
                    .collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_tracking(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.exchanges.tracking() {
        Ok(records) => Json(
            records
                .into_iter()
                .map(dto::ExchangeTrackingDto::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn acknowledge(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<dto::AcknowledgeBody>,
) -> axum::response::Response {
    match services
        .exchanges
        .acknowledge(ExchangeId::from_uuid(id), &body.acknowledged_by)
    {
        Ok(exchange) => Json(dto::ExchangeTrackingDto::from(exchange)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
