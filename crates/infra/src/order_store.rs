use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use gasflow_core::{Aggregate, DomainError, DomainResult, ExpectedVersion, OrderId, PlanId};
use gasflow_events::EventEnvelope;
use gasflow_orders::{DeliveryOrder, DeliveryOrderEvent};

const AGGREGATE_TYPE: &str = "orders.delivery";

/// In-memory append-only event store for delivery orders.
///
/// One stream per order id; `sequence_number` is monotonically increasing per
/// stream and doubles as the aggregate version for optimistic appends.
#[derive(Debug, Default)]
pub struct OrderStore {
    streams: RwLock<HashMap<OrderId, Vec<EventEnvelope<DeliveryOrderEvent>>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[EventEnvelope<DeliveryOrderEvent>]) -> u64 {
        stream.last().map(|e| e.sequence_number()).unwrap_or(0)
    }

    /// Append events to an order's stream, checking the expected version.
    pub fn append(
        &self,
        order_id: OrderId,
        events: Vec<DeliveryOrderEvent>,
        expected_version: ExpectedVersion,
    ) -> DomainResult<Vec<EventEnvelope<DeliveryOrderEvent>>> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::conflict("order store lock poisoned"))?;
        let stream = streams.entry(order_id).or_default();
        let current = Self::current_version(stream);
        expected_version.check(current)?;

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for event in events {
            let envelope = EventEnvelope::new(
                Uuid::now_v7(),
                order_id.into(),
                AGGREGATE_TYPE,
                next,
                event,
            );
            next += 1;
            stream.push(envelope.clone());
            committed.push(envelope);
        }
        Ok(committed)
    }

    /// Rehydrate an order from its stream. The returned aggregate reports
    /// `exists() == false` when the stream is empty.
    pub fn load(&self, order_id: OrderId) -> DomainResult<DeliveryOrder> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::conflict("order store lock poisoned"))?;
        let mut order = DeliveryOrder::empty(order_id);
        if let Some(stream) = streams.get(&order_id) {
            for envelope in stream {
                order.apply(envelope.payload());
            }
        }
        Ok(order)
    }

    /// Rehydrate, failing when the order has never been created.
    pub fn load_existing(&self, order_id: OrderId) -> DomainResult<DeliveryOrder> {
        let order = self.load(order_id)?;
        if !order.exists() {
            return Err(DomainError::not_found(format!("order {order_id}")));
        }
        Ok(order)
    }

    /// The raw event stream of one order (audit/debug view).
    pub fn stream(&self, order_id: OrderId) -> DomainResult<Vec<EventEnvelope<DeliveryOrderEvent>>> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::conflict("order store lock poisoned"))?;
        Ok(streams.get(&order_id).cloned().unwrap_or_default())
    }

    /// Rehydrate every order. Fine at in-memory scale; a projection would
    /// replace this against a real store.
    pub fn all(&self) -> DomainResult<Vec<DeliveryOrder>> {
        let ids: Vec<OrderId> = {
            let streams = self
                .streams
                .read()
                .map_err(|_| DomainError::conflict("order store lock poisoned"))?;
            streams.keys().copied().collect()
        };
        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            orders.push(self.load(id)?);
        }
        orders.sort_by_key(|o| *o.id_typed().as_uuid());
        Ok(orders)
    }

    /// Orders currently assigned to a plan.
    pub fn by_plan(&self, plan_id: PlanId) -> DomainResult<Vec<DeliveryOrder>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|o| o.plan_id() == Some(plan_id))
            .collect())
    }
}
