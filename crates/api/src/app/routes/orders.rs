use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use gasflow_core::{CustomerId, CylinderTypeId, OrderId, PlanId, VehicleId};
use gasflow_infra::{NewOrderInput, NewOrderLine, OrderView};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/assign", post(assign_plan))
        .route("/:id", get(get_order))
        .route("/:id/lines", post(add_line))
        .route("/:id/confirm", post(confirm))
        .route("/:id/loaded", post(mark_loaded))
        .route("/:id/transit", post(start_transit))
        .route("/:id/delivered", post(mark_delivered))
        .route("/:id/cancel", post(cancel))
        .route("/:id/events", get(order_events))
}

fn ok(view: OrderView) -> axum::response::Response {
    Json(view).into_response()
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderBody>,
) -> axum::response::Response {
    let input = NewOrderInput {
        customer_id: CustomerId::from_uuid(body.customer_id),
        expected_empty_override: body.expected_empty_override,
        lines: body
            .lines
            .into_iter()
            .map(|line| NewOrderLine {
                cylinder_type_id: CylinderTypeId::from_uuid(line.cylinder_type_id),
                quantity: line.quantity,
            })
            .collect(),
    };

    match services.orders.create_order(input) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list() {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.get(OrderId::from_uuid(id)) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<dto::OrderLineBody>,
) -> axum::response::Response {
    match services.orders.add_line(
        OrderId::from_uuid(id),
        CylinderTypeId::from_uuid(body.cylinder_type_id),
        body.quantity,
    ) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.confirm(OrderId::from_uuid(id)) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn assign_plan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AssignPlanBody>,
) -> axum::response::Response {
    let order_ids: Vec<OrderId> = body.order_ids.into_iter().map(OrderId::from_uuid).collect();

    match services.orders.assign_plan(
        PlanId::from_uuid(body.plan_id),
        VehicleId::from_uuid(body.vehicle_id),
        body.driver,
        &order_ids,
    ) {
        Ok(views) => Json(views).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn mark_loaded(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.mark_loaded(OrderId::from_uuid(id)) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn start_transit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.start_transit(OrderId::from_uuid(id)) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn mark_delivered(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.mark_delivered(OrderId::from_uuid(id)) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
    Json(body): Json<dto::CancelOrderBody>,
) -> axum::response::Response {
    match services.orders.cancel(OrderId::from_uuid(id), body.reason) {
        Ok(view) => ok(view),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn order_events(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<uuid::Uuid>,
) -> axum::response::Response {
    match services.orders.events(OrderId::from_uuid(id)) {
        Ok(stream) => Json(stream).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
