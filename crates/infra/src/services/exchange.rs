use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use gasflow_core::{CustomerId, CylinderStatus, DomainError, DomainResult, ExchangeId, Location, OrderId};
use gasflow_exchange::{
    allocate_expected_shares, build_delivery_movements, check_customer_stock, CustomerStock,
    ExchangeLine, ExchangeTracking, ReturnDestination,
};
use gasflow_inventory::{CompoundGuard, InventoryKey, Movement, StockPoint};

use crate::ledger::SharedLedger;
use crate::order_store::OrderStore;
use crate::registry::ExchangeRegistry;

/// Input for recording a delivery exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordExchangeInput {
    pub order_id: OrderId,
    pub filled_delivered: i64,
    pub empty_collected: i64,
    /// Defaults to the order's own expectation when absent.
    pub expected_empty: Option<i64>,
    pub variance_reason: Option<String>,
    pub customer_acknowledged: bool,
    pub notes: Option<String>,
    pub return_destination: ReturnDestination,
    pub actor: String,
}

/// A persisted exchange together with the ledger movements it produced.
#[derive(Debug, Clone)]
pub struct RecordedExchange {
    pub exchange: ExchangeTracking,
    pub movements: Vec<Movement>,
}

/// Verifies and records the filled-for-empty swap at a delivery stop, then
/// drives the resulting ledger movements as one compound apply.
#[derive(Debug, Clone)]
pub struct ExchangeService {
    ledger: Arc<SharedLedger>,
    orders: Arc<OrderStore>,
    registry: Arc<ExchangeRegistry>,
}

impl ExchangeService {
    pub fn new(
        ledger: Arc<SharedLedger>,
        orders: Arc<OrderStore>,
        registry: Arc<ExchangeRegistry>,
    ) -> Self {
        Self {
            ledger,
            orders,
            registry,
        }
    }

    /// Record an exchange for an order.
    ///
    /// Ordering matters: all validation (variance reason, customer stock
    /// pre-check) happens before anything is persisted; the tracking row is
    /// persisted before the movements are attempted, since its existence is
    /// what later unlocks the DELIVERED transition; and a movement failure
    /// removes the row again so a failed exchange leaves no trace.
    pub fn record_exchange(&self, input: RecordExchangeInput) -> DomainResult<RecordedExchange> {
        let order = self.orders.load_existing(input.order_id)?;
        let customer_id = order
            .customer_id()
            .ok_or_else(|| DomainError::not_found(format!("customer of order {}", input.order_id)))?;
        let vehicle_id = order.vehicle_id().ok_or_else(|| {
            DomainError::state_transition(format!(
                "order {} is not assigned to a vehicle; assign a dispatch plan before recording the exchange",
                input.order_id
            ))
        })?;

        if self.registry.by_order(input.order_id)?.is_some() {
            return Err(DomainError::conflict(format!(
                "order {} already has an exchange record",
                input.order_id
            )));
        }

        let expected_empty = input
            .expected_empty
            .unwrap_or_else(|| order.default_expected_empty());

        let exchange = ExchangeTracking::record(
            ExchangeId::new(),
            input.order_id,
            input.filled_delivered,
            input.empty_collected,
            expected_empty,
            input.variance_reason,
            input.customer_acknowledged,
            input.notes,
            Utc::now(),
        )?;

        let lines = delivery_lines(&order.lines(), input.filled_delivered);

        // Version snapshot of every key the compound can touch, taken before
        // the stock reads that drive the pre-check and the conversion sizing.
        let keys = touched_keys(&lines, customer_id, vehicle_id, input.return_destination);
        let guards = self.ledger.guards_for(keys)?;

        let mut stock = Vec::with_capacity(lines.len());
        for line in &lines {
            stock.push(CustomerStock {
                empty: self.ledger.available_quantity(&customer_key(
                    line.cylinder_type_id,
                    customer_id,
                    CylinderStatus::Empty,
                ))?,
                filled: self.ledger.available_quantity(&customer_key(
                    line.cylinder_type_id,
                    customer_id,
                    CylinderStatus::Filled,
                ))?,
            });
        }
        check_customer_stock(&lines, &stock, input.empty_collected, expected_empty)?;

        self.registry.insert(exchange.clone())?;

        let legs = build_delivery_movements(
            &exchange,
            customer_id,
            vehicle_id,
            &lines,
            &stock,
            input.return_destination,
            &input.actor,
        )?;
        let guard = CompoundGuard {
            reference_transaction_id: exchange.id().into(),
            expected: guards,
        };

        match self.ledger.apply_compound(legs, guard) {
            Ok(movements) => {
                info!(
                    order_id = %input.order_id,
                    exchange_id = %exchange.id(),
                    variance_qty = exchange.variance_qty(),
                    variance_type = %exchange.variance_type(),
                    legs = movements.len(),
                    "exchange recorded"
                );
                Ok(RecordedExchange { exchange, movements })
            }
            Err(err) => {
                warn!(
                    order_id = %input.order_id,
                    exchange_id = %exchange.id(),
                    error = %err,
                    "exchange movements failed; removing tracking row"
                );
                self.registry.remove(exchange.id())?;
                Err(err)
            }
        }
    }

    pub fn tracking(&self) -> DomainResult<Vec<ExchangeTracking>> {
        self.registry.all()
    }

    pub fn by_order(&self, order_id: OrderId) -> DomainResult<Option<ExchangeTracking>> {
        self.registry.by_order(order_id)
    }

    pub fn acknowledge(&self, exchange_id: ExchangeId, by: &str) -> DomainResult<ExchangeTracking> {
        self.registry.acknowledge(exchange_id, by, Utc::now())
    }
}

/// Order lines annotated with per-line delivered quantities. A full delivery
/// maps 1:1 to the ordered quantities; a partial one splits proportionally,
/// same floor rule as the empty-return split.
fn delivery_lines(lines: &[gasflow_orders::OrderLine], filled_delivered: i64) -> Vec<ExchangeLine> {
    let ordered: Vec<i64> = lines.iter().map(|l| l.quantity).collect();
    let total: i64 = ordered.iter().sum();
    let delivered: Vec<i64> = if filled_delivered == total {
        ordered.clone()
    } else {
        allocate_expected_shares(&ordered, filled_delivered)
    };
    lines
        .iter()
        .zip(delivered)
        .map(|(line, delivered_quantity)| ExchangeLine {
            cylinder_type_id: line.cylinder_type_id,
            ordered_quantity: line.quantity,
            delivered_quantity,
        })
        .collect()
}

fn customer_key(
    cylinder_type_id: gasflow_core::CylinderTypeId,
    customer_id: CustomerId,
    status: CylinderStatus,
) -> InventoryKey {
    InventoryKey::from_point(
        cylinder_type_id,
        &StockPoint::new(Location::customer(customer_id), status),
    )
}

fn touched_keys(
    lines: &[ExchangeLine],
    customer_id: CustomerId,
    vehicle_id: gasflow_core::VehicleId,
    destination: ReturnDestination,
) -> Vec<InventoryKey> {
    let destination_location = match destination {
        ReturnDestination::Yard => Location::yard(),
        ReturnDestination::Vehicle => Location::vehicle(vehicle_id),
    };
    let mut keys = BTreeSet::new();
    for line in lines {
        let ct = line.cylinder_type_id;
        keys.insert(InventoryKey::from_point(
            ct,
            &StockPoint::new(Location::vehicle(vehicle_id), CylinderStatus::Filled),
        ));
        keys.insert(customer_key(ct, customer_id, CylinderStatus::Filled));
        keys.insert(customer_key(ct, customer_id, CylinderStatus::Empty));
        keys.insert(InventoryKey::from_point(
            ct,
            &StockPoint::new(destination_location, CylinderStatus::Empty),
        ));
    }
    keys.into_iter().collect()
}
