//! Request/response DTOs and JSON mapping helpers.
//!
//! Inventory endpoints speak camelCase, matching the dashboard consumer;
//! exchange and reconciliation endpoints speak snake_case, matching the
//! dispatch tooling. Both shapes are part of the public contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gasflow_exchange::ExchangeTracking;
use gasflow_inventory::{DashboardRow, InventoryRecord, Movement, StockPoint};
use gasflow_reconciliation::{CountDiscrepancy, DailyReconciliation, VehicleCountReport};

// ---- inventory (camelCase) ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub location_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub cylinder_status: Option<String>,
    pub cylinder_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequestBody {
    pub cylinder_type_id: Uuid,
    pub from_location_type: Option<String>,
    pub from_location_reference_id: Option<Uuid>,
    pub to_location_type: String,
    pub to_location_reference_id: Option<Uuid>,
    pub quantity: i64,
    pub cylinder_status: String,
    pub movement_type: String,
    pub reference_transaction_id: Option<Uuid>,
    pub notes: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeBody {
    pub location_type: String,
    pub reference_id: Option<Uuid>,
    pub cylinders: Vec<InitializeEntryBody>,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeEntryBody {
    pub cylinder_type_id: Uuid,
    pub quantity: i64,
    pub cylinder_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementHistoryQuery {
    pub cylinder_type_id: Option<Uuid>,
    pub movement_type: Option<String>,
    pub reference_transaction_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecordDto {
    pub cylinder_type_id: Uuid,
    pub location_type: String,
    pub reference_id: Option<Uuid>,
    pub cylinder_status: String,
    pub quantity: i64,
    pub version: u64,
}

impl From<InventoryRecord> for InventoryRecordDto {
    fn from(record: InventoryRecord) -> Self {
        Self {
            cylinder_type_id: *record.key.cylinder_type_id.as_uuid(),
            location_type: record.key.location_type.to_string(),
            reference_id: record.key.reference_id,
            cylinder_status: record.key.status.to_string(),
            quantity: record.quantity,
            version: record.version,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRowDto {
    pub location_type: String,
    pub cylinder_status: String,
    pub total_quantity: i64,
}

impl From<DashboardRow> for DashboardRowDto {
    fn from(row: DashboardRow) -> Self {
        Self {
            location_type: row.location_type.to_string(),
            cylinder_status: row.status.to_string(),
            total_quantity: row.total_quantity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPointDto {
    pub location_type: String,
    pub reference_id: Option<Uuid>,
    pub cylinder_status: String,
}

impl From<StockPoint> for StockPointDto {
    fn from(point: StockPoint) -> Self {
        Self {
            location_type: point.location.location_type().to_string(),
            reference_id: point.location.reference_id(),
            cylinder_status: point.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub id: Uuid,
    pub cylinder_type_id: Uuid,
    pub source: Option<StockPointDto>,
    pub destination: StockPointDto,
    pub quantity: i64,
    pub movement_type: String,
    pub reference_transaction_id: Option<Uuid>,
    pub actor: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<Movement> for MovementDto {
    fn from(movement: Movement) -> Self {
        Self {
            id: *movement.id.as_uuid(),
            cylinder_type_id: *movement.cylinder_type_id.as_uuid(),
            source: movement.source.map(Into::into),
            destination: movement.destination.into(),
            quantity: movement.quantity,
            movement_type: movement.movement_type.to_string(),
            reference_transaction_id: movement.reference_transaction_id,
            actor: movement.actor,
            notes: movement.notes,
            recorded_at: movement.recorded_at,
        }
    }
}

// ---- exchange (snake_case) ----

#[derive(Debug, Deserialize)]
pub struct RecordExchangeBody {
    pub order_id: Uuid,
    pub filled_delivered: i64,
    pub empty_collected: i64,
    pub expected_empty: Option<i64>,
    pub variance_reason: Option<String>,
    #[serde(default)]
    pub customer_acknowledged: bool,
    pub notes: Option<String>,
    /// YARD (default) or VEHICLE.
    pub return_destination: Option<String>,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeBody {
    pub acknowledged_by: String,
}

#[derive(Debug, Serialize)]
pub struct ExchangeTrackingDto {
    pub id: Uuid,
    pub order_id: Uuid,
    pub filled_delivered: i64,
    pub empty_collected: i64,
    pub expected_empty: i64,
    pub variance_qty: i64,
    pub variance_type: String,
    pub variance_reason: Option<String>,
    pub customer_acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ExchangeTracking> for ExchangeTrackingDto {
    fn from(exchange: ExchangeTracking) -> Self {
        Self {
            id: *exchange.id().as_uuid(),
            order_id: *exchange.order_id().as_uuid(),
            filled_delivered: exchange.filled_delivered(),
            empty_collected: exchange.empty_collected(),
            expected_empty: exchange.expected_empty(),
            variance_qty: exchange.variance_qty(),
            variance_type: exchange.variance_type().to_string(),
            variance_reason: exchange.variance_reason().map(str::to_owned),
            customer_acknowledged: exchange.customer_acknowledged(),
            acknowledged_by: exchange.acknowledged_by().map(str::to_owned),
            acknowledged_at: exchange.acknowledged_at(),
            notes: exchange.notes().map(str::to_owned),
            created_at: exchange.created_at(),
        }
    }
}

// ---- reconciliation (snake_case) ----

#[derive(Debug, Deserialize)]
pub struct DailyReconciliationBody {
    pub plan_id: Uuid,
    pub reconciled_by: String,
    pub reconciliation_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountInventoryBody {
    pub plan_id: Uuid,
    pub inventory_items: Vec<CountInventoryItemBody>,
}

#[derive(Debug, Deserialize)]
pub struct CountInventoryItemBody {
    pub cylinder_type_id: Uuid,
    pub actual_remaining: i64,
    pub variance_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyReconciliationDto {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub reconciled_by: String,
    pub reconciliation_notes: Option<String>,
    pub total_orders: u64,
    pub total_shortages: i64,
    pub total_excess: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl From<DailyReconciliation> for DailyReconciliationDto {
    fn from(recon: DailyReconciliation) -> Self {
        let summary = recon.summary();
        Self {
            id: *recon.id().as_uuid(),
            plan_id: *recon.plan_id().as_uuid(),
            reconciled_by: recon.reconciled_by().to_owned(),
            reconciliation_notes: recon.notes().map(str::to_owned),
            total_orders: summary.total_orders,
            total_shortages: summary.total_shortages,
            total_excess: summary.total_excess,
            status: recon.status().to_string(),
            created_at: recon.created_at(),
            closed_at: recon.closed_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountDiscrepancyDto {
    pub cylinder_type_id: Uuid,
    pub expected_remaining: i64,
    pub actual_remaining: i64,
    pub variance: i64,
    pub reason: String,
}

impl From<CountDiscrepancy> for CountDiscrepancyDto {
    fn from(d: CountDiscrepancy) -> Self {
        Self {
            cylinder_type_id: *d.cylinder_type_id.as_uuid(),
            expected_remaining: d.expected_remaining,
            actual_remaining: d.actual_remaining,
            variance: d.variance,
            reason: d.reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleCountReportDto {
    pub plan_id: Uuid,
    pub clean: bool,
    pub discrepancies: Vec<CountDiscrepancyDto>,
    pub counted_at: DateTime<Utc>,
}

impl From<VehicleCountReport> for VehicleCountReportDto {
    fn from(report: VehicleCountReport) -> Self {
        Self {
            plan_id: *report.plan_id.as_uuid(),
            clean: report.is_clean(),
            counted_at: report.counted_at,
            discrepancies: report.discrepancies.into_iter().map(Into::into).collect(),
        }
    }
}

// ---- orders (snake_case) ----

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub customer_id: Uuid,
    pub expected_empty_override: Option<i64>,
    pub lines: Vec<OrderLineBody>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineBody {
    pub cylinder_type_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignPlanBody {
    pub plan_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver: Option<String>,
    pub order_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderBody {
    pub reason: Option<String>,
}
