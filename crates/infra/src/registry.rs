use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use gasflow_core::{DomainError, DomainResult, ExchangeId, OrderId};
use gasflow_exchange::ExchangeTracking;

/// Registry of exchange records, unique per order.
///
/// An order's record existing here is the gate for its DELIVERED transition.
#[derive(Debug, Default)]
pub struct ExchangeRegistry {
    by_order: RwLock<HashMap<OrderId, ExchangeTracking>>,
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<OrderId, ExchangeTracking>>> {
        self.by_order
            .read()
            .map_err(|_| DomainError::conflict("exchange registry lock poisoned"))
    }

    fn write(
        &self,
    ) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<OrderId, ExchangeTracking>>> {
        self.by_order
            .write()
            .map_err(|_| DomainError::conflict("exchange registry lock poisoned"))
    }

    /// Persist a new record; at most one active record per order.
    pub fn insert(&self, exchange: ExchangeTracking) -> DomainResult<()> {
        let mut by_order = self.write()?;
        if by_order.contains_key(&exchange.order_id()) {
            return Err(DomainError::conflict(format!(
                "order {} already has an exchange record",
                exchange.order_id()
            )));
        }
        by_order.insert(exchange.order_id(), exchange);
        Ok(())
    }

    /// Compensating removal when the movement legs fail after the record was
    /// persisted. Only the exact record that was inserted is removed.
    pub fn remove(&self, exchange_id: ExchangeId) -> DomainResult<()> {
        let mut by_order = self.write()?;
        by_order.retain(|_, e| e.id() != exchange_id);
        Ok(())
    }

    pub fn by_order(&self, order_id: OrderId) -> DomainResult<Option<ExchangeTracking>> {
        Ok(self.read()?.get(&order_id).cloned())
    }

    /// All records, keyed by order, in a stable order.
    pub fn all(&self) -> DomainResult<Vec<ExchangeTracking>> {
        let mut records: Vec<ExchangeTracking> = self.read()?.values().cloned().collect();
        records.sort_by_key(|e| *e.order_id().as_uuid());
        Ok(records)
    }

    /// Records for a set of orders (a plan's day).
    pub fn for_orders(&self, order_ids: &[OrderId]) -> DomainResult<Vec<ExchangeTracking>> {
        let by_order = self.read()?;
        Ok(order_ids
            .iter()
            .filter_map(|id| by_order.get(id).cloned())
            .collect())
    }

    /// Mark the customer's sign-off on an existing record.
    pub fn acknowledge(
        &self,
        exchange_id: ExchangeId,
        by: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<ExchangeTracking> {
        let mut by_order = self.write()?;
        let exchange = by_order
            .values_mut()
            .find(|e| e.id() == exchange_id)
            .ok_or_else(|| DomainError::not_found(format!("exchange {exchange_id}")))?;
        exchange.acknowledge(by, at);
        Ok(exchange.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order_id: OrderId) -> ExchangeTracking {
        ExchangeTracking::record(
            ExchangeId::new(),
            order_id,
            50,
            50,
            50,
            None,
            false,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn second_record_for_an_order_conflicts() {
        let registry = ExchangeRegistry::new();
        let order_id = OrderId::new();
        registry.insert(record(order_id)).unwrap();
        assert!(matches!(
            registry.insert(record(order_id)),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn remove_compensates_a_failed_compound() {
        let registry = ExchangeRegistry::new();
        let order_id = OrderId::new();
        let exchange = record(order_id);
        let id = exchange.id();
        registry.insert(exchange).unwrap();
        registry.remove(id).unwrap();
        assert!(registry.by_order(order_id).unwrap().is_none());
    }

    #[test]
    fn acknowledge_updates_the_stored_record() {
        let registry = ExchangeRegistry::new();
        let order_id = OrderId::new();
        let exchange = record(order_id);
        let id = exchange.id();
        registry.insert(exchange).unwrap();

        let updated = registry.acknowledge(id, "site manager", Utc::now()).unwrap();
        assert!(updated.customer_acknowledged());
        assert!(registry
            .by_order(order_id)
            .unwrap()
            .unwrap()
            .customer_acknowledged());
    }
}
