//! Store and service wiring shared by every handler.

use std::sync::Arc;

use gasflow_infra::{
    ExchangeRegistry, ExchangeService, OrderService, OrderStore, ReconciliationService,
    SharedLedger,
};

/// Everything the handlers need, built once at startup.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub ledger: Arc<SharedLedger>,
    pub orders: OrderService,
    pub exchanges: ExchangeService,
    pub reconciliation: ReconciliationService,
}

pub fn build_services() -> AppServices {
    let ledger = Arc::new(SharedLedger::new());
    let order_store = Arc::new(OrderStore::new());
    let registry = Arc::new(ExchangeRegistry::new());

    AppServices {
        ledger: Arc::clone(&ledger),
        orders: OrderService::new(Arc::clone(&order_store), Arc::clone(&registry)),
        exchanges: ExchangeService::new(
            Arc::clone(&ledger),
            Arc::clone(&order_store),
            Arc::clone(&registry),
        ),
        reconciliation: ReconciliationService::new(ledger, order_store, registry),
    }
}
