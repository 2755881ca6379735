use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use gasflow_core::{CylinderTypeId, PlanId, ReconciliationId};
use gasflow_reconciliation::VehicleCountLine;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/daily", post(create_daily))
        .route("/", get(list_daily))
        .route("/:id/close", post(close_daily))
        .route("/count-inventory", post(count_inventory))
}

pub async fn create_daily(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::DailyReconciliationBody>,
) -> axum::response::Response {
    match services.reconciliation.create_daily(
        PlanId::from_uuid(body.plan_id),
        &body.reconciled_by,
        body.reconciliation_notes,
    ) {
        Ok(recon) => (
            StatusCode::CREATED,
            Json(dto::DailyReconciliationDto::from(recon)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_daily(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reconciliation.list() {
        Ok(reports) => Json(
            reports
                .into_iter()
                .map(dto::DailyReconciliationDto::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn close_daily(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.reconciliation.close(ReconciliationId::from_uuid(id)) {
        Ok(recon) => Json(dto::DailyReconciliationDto::from(recon)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn count_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CountInventoryBody>,
) -> axum::response::Response {
    let items = body
        .inventory_items
        .into_iter()
        .map(|item| VehicleCountLine {
            cylinder_type_id: CylinderTypeId::from_uuid(item.cylinder_type_id),
            actual_remaining: item.actual_remaining,
            variance_reason: item.variance_reason,
        })
        .collect();

    match services
        .reconciliation
        .count_vehicle_inventory(PlanId::from_uuid(body.plan_id), items)
    {
        Ok(report) => (
            StatusCode::CREATED,
            Json(dto::VehicleCountReportDto::from(report)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
