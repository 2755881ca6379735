use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use gasflow_core::{
    CylinderStatus, CylinderTypeId, DomainResult, Location, LocationType,
};
use gasflow_inventory::{
    InitEntry, InventoryFilter, InventoryKey, MovementFilter, MovementRequest, MovementType,
    StockPoint,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(query_inventory))
        .route("/dashboard", get(dashboard))
        .route(
            "/available/:cylinder_type_id/:location_type/:reference_id/:status",
            get(available),
        )
        .route("/movements", post(apply_movement).get(movement_history))
        .route("/initialize", post(initialize))
}

fn parse_location(location_type: &str, reference_id: Option<uuid::Uuid>) -> DomainResult<Location> {
    Location::new(location_type.parse()?, reference_id)
}

pub async fn query_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::InventoryQuery>,
) -> axum::response::Response {
    let mut filter = InventoryFilter {
        reference_id: query.reference_id,
        cylinder_type_id: query.cylinder_type_id.map(CylinderTypeId::from_uuid),
        ..Default::default()
    };
    if let Some(lt) = &query.location_type {
        filter.location_type = match lt.parse::<LocationType>() {
            Ok(v) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        };
    }
    if let Some(status) = &query.cylinder_status {
        filter.status = match status.parse::<CylinderStatus>() {
            Ok(v) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        };
    }

    match services.ledger.query(&filter) {
        Ok(records) => Json(
            records
                .into_iter()
                .map(dto::InventoryRecordDto::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.dashboard() {
        Ok(rows) => Json(
            rows.into_iter()
                .map(dto::DashboardRowDto::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// `reference_id` is the entity uuid for VEHICLE/CUSTOMER, or the literal `0`
/// for unreferenced locations.
pub async fn available(
    Extension(services): Extension<Arc<AppServices>>,
    Path((cylinder_type_id, location_type, reference_id, status)): Path<(
        uuid::Uuid,
        String,
        String,
        String,
    )>,
) -> axum::response::Response {
    let reference = if reference_id == "0" {
        None
    } else {
        match reference_id.parse::<uuid::Uuid>() {
            Ok(v) => Some(v),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "reference_id must be a uuid or the literal 0",
                )
            }
        }
    };

    let key = match (|| -> DomainResult<InventoryKey> {
        let location = parse_location(&location_type, reference)?;
        Ok(InventoryKey::from_point(
            CylinderTypeId::from_uuid(cylinder_type_id),
            &StockPoint::new(location, status.parse()?),
        ))
    })() {
        Ok(key) => key,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.available_quantity(&key) {
        Ok(quantity) => Json(serde_json::json!({ "quantity": quantity })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn apply_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::MovementRequestBody>,
) -> axum::response::Response {
    let request = match (|| -> DomainResult<MovementRequest> {
        let status: CylinderStatus = body.cylinder_status.parse()?;
        let source = match &body.from_location_type {
            Some(lt) => Some(StockPoint::new(
                parse_location(lt, body.from_location_reference_id)?,
                status,
            )),
            None => None,
        };
        let destination = StockPoint::new(
            parse_location(&body.to_location_type, body.to_location_reference_id)?,
            status,
        );
        Ok(MovementRequest {
            cylinder_type_id: CylinderTypeId::from_uuid(body.cylinder_type_id),
            source,
            destination,
            quantity: body.quantity,
            movement_type: body.movement_type.parse::<MovementType>()?,
            reference_transaction_id: body.reference_transaction_id,
            actor: body.actor.unwrap_or_else(|| "api".to_string()),
            notes: body.notes,
        })
    })() {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger.apply(request) {
        Ok(movement) => (StatusCode::CREATED, Json(dto::MovementDto::from(movement))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn movement_history(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementHistoryQuery>,
) -> axum::response::Response {
    let mut filter = MovementFilter {
        cylinder_type_id: query.cylinder_type_id.map(CylinderTypeId::from_uuid),
        reference_transaction_id: query.reference_transaction_id,
        ..Default::default()
    };
    if let Some(mt) = &query.movement_type {
        filter.movement_type = match mt.parse::<MovementType>() {
            Ok(v) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        };
    }

    match services.ledger.movements(&filter) {
        Ok(movements) => Json(
            movements
                .into_iter()
                .map(dto::MovementDto::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn initialize(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::InitializeBody>,
) -> axum::response::Response {
    let (location, entries) = match (|| -> DomainResult<(Location, Vec<InitEntry>)> {
        let location = parse_location(&body.location_type, body.reference_id)?;
        let mut entries = Vec::with_capacity(body.cylinders.len());
        for entry in &body.cylinders {
            entries.push(InitEntry {
                cylinder_type_id: CylinderTypeId::from_uuid(entry.cylinder_type_id),
                quantity: entry.quantity,
                status: entry.cylinder_status.parse()?,
            });
        }
        Ok((location, entries))
    })() {
        Ok(parsed) => parsed,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let actor = body.actor.unwrap_or_else(|| "api".to_string());
    match services.ledger.initialize(location, entries, actor) {
        Ok(movements) => (
            StatusCode::CREATED,
            Json(
                movements
                    .into_iter()
                    .map(dto::MovementDto::from)
                    .collect::<Vec<_>>(),
            ),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
