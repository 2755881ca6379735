use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gasflow_core::{
    Aggregate, AggregateRoot, CustomerId, CylinderTypeId, DomainError, ExchangeId, OrderId, PlanId,
    VehicleId,
};
use gasflow_events::Event;

/// Delivery order lifecycle.
///
/// `Delivered` and `Cancelled` are terminal; `Cancelled` is reachable from
/// every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Assigned,
    Loaded,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::Loaded => "LOADED",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line: cylinder type + ordered quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub cylinder_type_id: CylinderTypeId,
    pub quantity: i64,
}

/// Aggregate root: DeliveryOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOrder {
    id: OrderId,
    customer_id: Option<CustomerId>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    plan_id: Option<PlanId>,
    vehicle_id: Option<VehicleId>,
    driver: Option<String>,
    exchange_id: Option<ExchangeId>,
    /// Per-order override of the 1:1 delivered-to-expected-empty default
    /// (e.g. a new customer with no prior empties to hand back).
    expected_empty_override: Option<i64>,
    version: u64,
    created: bool,
}

impl DeliveryOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            customer_id: None,
            status: OrderStatus::Pending,
            lines: Vec::new(),
            plan_id: None,
            vehicle_id: None,
            driver: None,
            exchange_id: None,
            expected_empty_override: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn exists(&self) -> bool {
        self.created
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn plan_id(&self) -> Option<PlanId> {
        self.plan_id
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle_id
    }

    pub fn driver(&self) -> Option<&str> {
        self.driver.as_deref()
    }

    pub fn exchange_id(&self) -> Option<ExchangeId> {
        self.exchange_id
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }

    pub fn total_ordered_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// How many empties this order expects back unless the exchange request
    /// says otherwise: the per-order override, falling back to 1:1 with the
    /// ordered quantity.
    pub fn default_expected_empty(&self) -> i64 {
        self.expected_empty_override
            .unwrap_or_else(|| self.total_ordered_quantity())
    }
}

impl AggregateRoot for DeliveryOrder {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub expected_empty_override: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub order_id: OrderId,
    pub cylinder_type_id: CylinderTypeId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOrder {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignToPlan (dispatch groups orders with a vehicle/driver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignToPlan {
    pub order_id: OrderId,
    pub plan_id: PlanId,
    pub vehicle_id: VehicleId,
    pub driver: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkLoaded (explicit manual transition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkLoaded {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartTransit (explicit manual transition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTransit {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkDelivered.
///
/// Carries the id of the completed exchange record as evidence; the service
/// layer resolves it and refuses to build this command when no exchange
/// exists for the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDelivered {
    pub order_id: OrderId,
    pub exchange_id: ExchangeId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOrderCommand {
    CreateOrder(CreateOrder),
    AddLine(AddLine),
    ConfirmOrder(ConfirmOrder),
    AssignToPlan(AssignToPlan),
    MarkLoaded(MarkLoaded),
    StartTransit(StartTransit),
    MarkDelivered(MarkDelivered),
    CancelOrder(CancelOrder),
}

/// Event: OrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub expected_empty_override: Option<i64>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub order_id: OrderId,
    pub line_no: u32,
    pub cylinder_type_id: CylinderTypeId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAssigned {
    pub order_id: OrderId,
    pub plan_id: PlanId,
    pub vehicle_id: VehicleId,
    pub driver: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderLoaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLoaded {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderInTransit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInTransit {
    pub order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDelivered {
    pub order_id: OrderId,
    pub exchange_id: ExchangeId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOrderEvent {
    OrderCreated(OrderCreated),
    LineAdded(LineAdded),
    OrderConfirmed(OrderConfirmed),
    OrderAssigned(OrderAssigned),
    OrderLoaded(OrderLoaded),
    OrderInTransit(OrderInTransit),
    OrderDelivered(OrderDelivered),
    OrderCancelled(OrderCancelled),
}

impl Event for DeliveryOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryOrderEvent::OrderCreated(_) => "orders.delivery.created",
            DeliveryOrderEvent::LineAdded(_) => "orders.delivery.line_added",
            DeliveryOrderEvent::OrderConfirmed(_) => "orders.delivery.confirmed",
            DeliveryOrderEvent::OrderAssigned(_) => "orders.delivery.assigned",
            DeliveryOrderEvent::OrderLoaded(_) => "orders.delivery.loaded",
            DeliveryOrderEvent::OrderInTransit(_) => "orders.delivery.in_transit",
            DeliveryOrderEvent::OrderDelivered(_) => "orders.delivery.delivered",
            DeliveryOrderEvent::OrderCancelled(_) => "orders.delivery.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DeliveryOrderEvent::OrderCreated(e) => e.occurred_at,
            DeliveryOrderEvent::LineAdded(e) => e.occurred_at,
            DeliveryOrderEvent::OrderConfirmed(e) => e.occurred_at,
            DeliveryOrderEvent::OrderAssigned(e) => e.occurred_at,
            DeliveryOrderEvent::OrderLoaded(e) => e.occurred_at,
            DeliveryOrderEvent::OrderInTransit(e) => e.occurred_at,
            DeliveryOrderEvent::OrderDelivered(e) => e.occurred_at,
            DeliveryOrderEvent::OrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for DeliveryOrder {
    type Command = DeliveryOrderCommand;
    type Event = DeliveryOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DeliveryOrderEvent::OrderCreated(e) => {
                self.id = e.order_id;
                self.customer_id = Some(e.customer_id);
                self.status = OrderStatus::Pending;
                self.lines.clear();
                self.expected_empty_override = e.expected_empty_override;
                self.created = true;
            }
            DeliveryOrderEvent::LineAdded(e) => {
                self.lines.push(OrderLine {
                    line_no: e.line_no,
                    cylinder_type_id: e.cylinder_type_id,
                    quantity: e.quantity,
                });
            }
            DeliveryOrderEvent::OrderConfirmed(_) => {
                self.status = OrderStatus::Confirmed;
            }
            DeliveryOrderEvent::OrderAssigned(e) => {
                self.status = OrderStatus::Assigned;
                self.plan_id = Some(e.plan_id);
                self.vehicle_id = Some(e.vehicle_id);
                self.driver = e.driver.clone();
            }
            DeliveryOrderEvent::OrderLoaded(_) => {
                self.status = OrderStatus::Loaded;
            }
            DeliveryOrderEvent::OrderInTransit(_) => {
                self.status = OrderStatus::InTransit;
            }
            DeliveryOrderEvent::OrderDelivered(e) => {
                self.status = OrderStatus::Delivered;
                self.exchange_id = Some(e.exchange_id);
            }
            DeliveryOrderEvent::OrderCancelled(_) => {
                self.status = OrderStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DeliveryOrderCommand::CreateOrder(cmd) => self.handle_create(cmd),
            DeliveryOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            DeliveryOrderCommand::ConfirmOrder(cmd) => self.handle_confirm(cmd),
            DeliveryOrderCommand::AssignToPlan(cmd) => self.handle_assign(cmd),
            DeliveryOrderCommand::MarkLoaded(cmd) => self.handle_loaded(cmd),
            DeliveryOrderCommand::StartTransit(cmd) => self.handle_transit(cmd),
            DeliveryOrderCommand::MarkDelivered(cmd) => self.handle_delivered(cmd),
            DeliveryOrderCommand::CancelOrder(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl DeliveryOrder {
    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("order {}", self.id)));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn require_status(&self, expected: OrderStatus, attempted: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::state_transition(format!(
                "cannot {attempted} from {}; order must be {expected}",
                self.status
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOrder) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if let Some(expected) = cmd.expected_empty_override {
            if expected < 0 {
                return Err(DomainError::validation(
                    "expected_empty_override cannot be negative",
                ));
            }
        }
        Ok(vec![DeliveryOrderEvent::OrderCreated(OrderCreated {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            expected_empty_override: cmd.expected_empty_override,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::state_transition(
                "cannot modify order lines once the order is confirmed",
            ));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("line quantity must be positive"));
        }

        let next_line_no = (self.lines.len() as u32) + 1;
        Ok(vec![DeliveryOrderEvent::LineAdded(LineAdded {
            order_id: cmd.order_id,
            line_no: next_line_no,
            cylinder_type_id: cmd.cylinder_type_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmOrder) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.require_status(OrderStatus::Pending, "confirm")?;

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm order without lines"));
        }

        Ok(vec![DeliveryOrderEvent::OrderConfirmed(OrderConfirmed {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign(&self, cmd: &AssignToPlan) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.require_status(OrderStatus::Confirmed, "assign")?;

        Ok(vec![DeliveryOrderEvent::OrderAssigned(OrderAssigned {
            order_id: cmd.order_id,
            plan_id: cmd.plan_id,
            vehicle_id: cmd.vehicle_id,
            driver: cmd.driver.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_loaded(&self, cmd: &MarkLoaded) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.require_status(OrderStatus::Assigned, "mark loaded")?;

        Ok(vec![DeliveryOrderEvent::OrderLoaded(OrderLoaded {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transit(&self, cmd: &StartTransit) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.require_status(OrderStatus::Loaded, "start transit")?;

        Ok(vec![DeliveryOrderEvent::OrderInTransit(OrderInTransit {
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delivered(&self, cmd: &MarkDelivered) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.require_status(OrderStatus::InTransit, "mark delivered")?;

        Ok(vec![DeliveryOrderEvent::OrderDelivered(OrderDelivered {
            order_id: cmd.order_id,
            exchange_id: cmd.exchange_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOrder) -> Result<Vec<DeliveryOrderEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::state_transition(format!(
                "cannot cancel order in terminal state {}",
                self.status
            )));
        }

        Ok(vec![DeliveryOrderEvent::OrderCancelled(OrderCancelled {
            order_id: cmd.order_id,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_order(order_id: OrderId) -> DeliveryOrder {
        let mut order = DeliveryOrder::empty(order_id);
        let events = order
            .handle(&DeliveryOrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: CustomerId::new(),
                expected_empty_override: None,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    fn with_line(mut order: DeliveryOrder, quantity: i64) -> DeliveryOrder {
        let events = order
            .handle(&DeliveryOrderCommand::AddLine(AddLine {
                order_id: order.id_typed(),
                cylinder_type_id: CylinderTypeId::new(),
                quantity,
                occurred_at: test_time(),
            }))
            .unwrap();
        order.apply(&events[0]);
        order
    }

    fn advance(order: &mut DeliveryOrder, command: DeliveryOrderCommand) {
        let events = order.handle(&command).unwrap();
        for event in &events {
            order.apply(event);
        }
    }

    fn assigned_order(order_id: OrderId) -> DeliveryOrder {
        let mut order = with_line(created_order(order_id), 50);
        advance(
            &mut order,
            DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: test_time(),
            }),
        );
        advance(
            &mut order,
            DeliveryOrderCommand::AssignToPlan(AssignToPlan {
                order_id,
                plan_id: PlanId::new(),
                vehicle_id: VehicleId::new(),
                driver: Some("R. Kumar".to_string()),
                occurred_at: test_time(),
            }),
        );
        order
    }

    #[test]
    fn full_lifecycle_to_delivered() {
        let order_id = OrderId::new();
        let mut order = assigned_order(order_id);
        assert_eq!(order.status(), OrderStatus::Assigned);

        advance(
            &mut order,
            DeliveryOrderCommand::MarkLoaded(MarkLoaded {
                order_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(order.status(), OrderStatus::Loaded);

        advance(
            &mut order,
            DeliveryOrderCommand::StartTransit(StartTransit {
                order_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(order.status(), OrderStatus::InTransit);

        let exchange_id = ExchangeId::new();
        advance(
            &mut order,
            DeliveryOrderCommand::MarkDelivered(MarkDelivered {
                order_id,
                exchange_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.exchange_id(), Some(exchange_id));
    }

    #[test]
    fn delivered_requires_in_transit() {
        let order_id = OrderId::new();
        let order = assigned_order(order_id);

        let err = order
            .handle(&DeliveryOrderCommand::MarkDelivered(MarkDelivered {
                order_id,
                exchange_id: ExchangeId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::StateTransition(msg) if msg.contains("must be IN_TRANSIT") => {}
            other => panic!("expected StateTransition, got {other:?}"),
        }
    }

    #[test]
    fn cannot_confirm_without_lines() {
        let order_id = OrderId::new();
        let order = created_order(order_id);

        let err = order
            .handle(&DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cannot_add_line_after_confirmation() {
        let order_id = OrderId::new();
        let mut order = with_line(created_order(order_id), 10);
        advance(
            &mut order,
            DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: test_time(),
            }),
        );

        let err = order
            .handle(&DeliveryOrderCommand::AddLine(AddLine {
                order_id,
                cylinder_type_id: CylinderTypeId::new(),
                quantity: 5,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::StateTransition(_)));
    }

    #[test]
    fn cancel_is_reachable_from_any_non_terminal_state() {
        for stage in 0..4 {
            let order_id = OrderId::new();
            let mut order = match stage {
                0 => created_order(order_id),
                1 => {
                    let mut o = with_line(created_order(order_id), 5);
                    advance(
                        &mut o,
                        DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                            order_id,
                            occurred_at: test_time(),
                        }),
                    );
                    o
                }
                2 => assigned_order(order_id),
                _ => {
                    let mut o = assigned_order(order_id);
                    advance(
                        &mut o,
                        DeliveryOrderCommand::MarkLoaded(MarkLoaded {
                            order_id,
                            occurred_at: test_time(),
                        }),
                    );
                    o
                }
            };

            advance(
                &mut order,
                DeliveryOrderCommand::CancelOrder(CancelOrder {
                    order_id,
                    reason: Some("customer closed".to_string()),
                    occurred_at: test_time(),
                }),
            );
            assert_eq!(order.status(), OrderStatus::Cancelled);
        }
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let order_id = OrderId::new();
        let mut order = created_order(order_id);
        advance(
            &mut order,
            DeliveryOrderCommand::CancelOrder(CancelOrder {
                order_id,
                reason: None,
                occurred_at: test_time(),
            }),
        );

        let err = order
            .handle(&DeliveryOrderCommand::CancelOrder(CancelOrder {
                order_id,
                reason: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::StateTransition(_)));
    }

    #[test]
    fn default_expected_empty_follows_override_then_ordered_quantity() {
        let order_id = OrderId::new();
        let order = with_line(with_line(created_order(order_id), 30), 20);
        assert_eq!(order.default_expected_empty(), 50);

        let mut overridden = DeliveryOrder::empty(order_id);
        let events = overridden
            .handle(&DeliveryOrderCommand::CreateOrder(CreateOrder {
                order_id,
                customer_id: CustomerId::new(),
                expected_empty_override: Some(0),
                occurred_at: test_time(),
            }))
            .unwrap();
        overridden.apply(&events[0]);
        let overridden = with_line(overridden, 30);
        assert_eq!(overridden.default_expected_empty(), 0);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let order_id = OrderId::new();
        let order = with_line(created_order(order_id), 10);
        let version_before = order.version();
        let status_before = order.status();

        let events1 = order
            .handle(&DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        let events2 = order
            .handle(&DeliveryOrderCommand::ConfirmOrder(ConfirmOrder {
                order_id,
                occurred_at: events1[0].occurred_at(),
            }))
            .unwrap();

        assert_eq!(order.version(), version_before);
        assert_eq!(order.status(), status_before);
        assert_eq!(events1.len(), events2.len());
    }

    #[test]
    fn version_increments_on_apply() {
        let order_id = OrderId::new();
        let order = created_order(order_id);
        assert_eq!(order.version(), 1);
        let order = with_line(order, 5);
        assert_eq!(order.version(), 2);
    }
}
