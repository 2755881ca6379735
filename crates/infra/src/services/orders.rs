use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use gasflow_core::{
    Aggregate, AggregateRoot, CustomerId, CylinderTypeId, DomainError, DomainResult, ExpectedVersion,
    OrderId, PlanId, VehicleId,
};
use gasflow_events::EventEnvelope;
use gasflow_orders::{
    AddLine, AssignToPlan, CancelOrder, ConfirmOrder, CreateOrder, DeliveryOrder,
    DeliveryOrderCommand, DeliveryOrderEvent, MarkDelivered, MarkLoaded, OrderLine, OrderStatus,
    StartTransit,
};

use crate::order_store::OrderStore;
use crate::registry::ExchangeRegistry;

/// Input for creating an order with its initial lines.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderInput {
    pub customer_id: CustomerId,
    pub expected_empty_override: Option<i64>,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderLine {
    pub cylinder_type_id: CylinderTypeId,
    pub quantity: i64,
}

/// Read-side snapshot of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub plan_id: Option<PlanId>,
    pub vehicle_id: Option<VehicleId>,
    pub driver: Option<String>,
    pub total_ordered_quantity: i64,
    pub default_expected_empty: i64,
}

impl OrderView {
    fn from_order(order: &DeliveryOrder) -> Self {
        Self {
            order_id: order.id_typed(),
            customer_id: order.customer_id(),
            status: order.status(),
            lines: order.lines().to_vec(),
            plan_id: order.plan_id(),
            vehicle_id: order.vehicle_id(),
            driver: order.driver().map(str::to_owned),
            total_ordered_quantity: order.total_ordered_quantity(),
            default_expected_empty: order.default_expected_empty(),
        }
    }
}

/// Delivery order lifecycle, on top of the event-sourced order store.
///
/// Each command loads the aggregate, lets it decide, then appends with the
/// loaded version as the optimistic expectation.
#[derive(Debug, Clone)]
pub struct OrderService {
    store: Arc<OrderStore>,
    exchanges: Arc<ExchangeRegistry>,
}

impl OrderService {
    pub fn new(store: Arc<OrderStore>, exchanges: Arc<ExchangeRegistry>) -> Self {
        Self { store, exchanges }
    }

    fn execute(
        &self,
        order_id: OrderId,
        command: DeliveryOrderCommand,
    ) -> DomainResult<DeliveryOrder> {
        let mut order = self.store.load(order_id)?;
        let events = order.handle(&command)?;
        self.store
            .append(order_id, events.clone(), ExpectedVersion::Exact(order.version()))?;
        for event in &events {
            order.apply(event);
        }
        Ok(order)
    }

    pub fn create_order(&self, input: NewOrderInput) -> DomainResult<OrderView> {
        if input.lines.is_empty() {
            return Err(DomainError::validation("order needs at least one line"));
        }

        let order_id = OrderId::new();
        let mut order = DeliveryOrder::empty(order_id);
        let mut events = Vec::new();

        let mut stage = |order: &mut DeliveryOrder,
                         command: DeliveryOrderCommand|
         -> DomainResult<()> {
            let decided = order.handle(&command)?;
            for event in &decided {
                order.apply(event);
            }
            events.extend(decided);
            Ok(())
        };

        stage(
            &mut order,
            DeliveryOrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: input.customer_id,
                expected_empty_override: input.expected_empty_override,
                occurred_at: Utc::now(),
            }),
        )?;
        for line in input.lines {
            stage(
                &mut order,
                DeliveryOrderCommand::AddLine(AddLine {
                    order_id,
                    cylinder_type_id: line.cylinder_type_id,
                    quantity: line.quantity,
                    occurred_at: Utc::now(),
                }),
            )?;
        }

        self.store.append(order_id, events, ExpectedVersion::Exact(0))?;
        info!(order_id = %order_id, lines = order.lines().len(), "order created");
        Ok(OrderView::from_order(&order))
    }

    pub fn add_line(
        &self,
        order_id: OrderId,
        cylinder_type_id: CylinderTypeId,
        quantity: i64,
    ) -> DomainResult<OrderView> {
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::AddLine(AddLine {
                order_id,
                cylinder_type_id,
                quantity,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(OrderView::from_order(&order))
    }

    pub fn confirm(&self, order_id: OrderId) -> DomainResult<OrderView> {
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(OrderView::from_order(&order))
    }

    /// Batch assignment: dispatch groups confirmed orders under one plan with
    /// a vehicle and driver. Every order is validated before any is committed.
    pub fn assign_plan(
        &self,
        plan_id: PlanId,
        vehicle_id: VehicleId,
        driver: Option<String>,
        order_ids: &[OrderId],
    ) -> DomainResult<Vec<OrderView>> {
        if order_ids.is_empty() {
            return Err(DomainError::validation("plan assignment needs order ids"));
        }

        let mut staged = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            let order = self.store.load_existing(order_id)?;
            let events = order.handle(&DeliveryOrderCommand::AssignToPlan(AssignToPlan {
                order_id,
                plan_id,
                vehicle_id,
                driver: driver.clone(),
                occurred_at: Utc::now(),
            }))?;
            staged.push((order, events));
        }

        let mut views = Vec::with_capacity(staged.len());
        for (mut order, events) in staged {
            self.store.append(
                order.id_typed(),
                events.clone(),
                ExpectedVersion::Exact(order.version()),
            )?;
            for event in &events {
                order.apply(event);
            }
            views.push(OrderView::from_order(&order));
        }
        info!(plan_id = %plan_id, vehicle_id = %vehicle_id, orders = views.len(), "plan assigned");
        Ok(views)
    }

    pub fn mark_loaded(&self, order_id: OrderId) -> DomainResult<OrderView> {
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::MarkLoaded(MarkLoaded {
                order_id,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(OrderView::from_order(&order))
    }

    pub fn start_transit(&self, order_id: OrderId) -> DomainResult<OrderView> {
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::StartTransit(StartTransit {
                order_id,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(OrderView::from_order(&order))
    }

    /// DELIVERED is gated on the exchange record existing. The exchange is
    /// never auto-triggered from here; the caller must record it first.
    pub fn mark_delivered(&self, order_id: OrderId) -> DomainResult<OrderView> {
        let exchange = self.exchanges.by_order(order_id)?.ok_or_else(|| {
            DomainError::state_transition(format!(
                "order {order_id} has no exchange record; record the delivery exchange before marking delivered"
            ))
        })?;
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::MarkDelivered(MarkDelivered {
                order_id,
                exchange_id: exchange.id(),
                occurred_at: Utc::now(),
            }),
        )?;
        info!(order_id = %order_id, exchange_id = %exchange.id(), "order delivered");
        Ok(OrderView::from_order(&order))
    }

    pub fn cancel(&self, order_id: OrderId, reason: Option<String>) -> DomainResult<OrderView> {
        let order = self.execute(
            order_id,
            DeliveryOrderCommand::CancelOrder(CancelOrder {
                order_id,
                reason,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(OrderView::from_order(&order))
    }

    pub fn get(&self, order_id: OrderId) -> DomainResult<OrderView> {
        Ok(OrderView::from_order(&self.store.load_existing(order_id)?))
    }

    pub fn list(&self) -> DomainResult<Vec<OrderView>> {
        Ok(self
            .store
            .all()?
            .iter()
            .map(OrderView::from_order)
            .collect())
    }

    pub fn events(&self, order_id: OrderId) -> DomainResult<Vec<EventEnvelope<DeliveryOrderEvent>>> {
        self.store.load_existing(order_id)?;
        self.store.stream(order_id)
    }
}
