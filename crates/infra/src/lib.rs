//! In-memory infrastructure: shared stores and the services that coordinate
//! ledger, orders, exchanges and reconciliation.

pub mod ledger;
pub mod order_store;
pub mod registry;
pub mod services;


pub use ledger::SharedLedger;
pub use order_store::OrderStore;
pub use registry::ExchangeRegistry;
pub use services::exchange::{ExchangeService, RecordExchangeInput, RecordedExchange};
pub use services::orders::{NewOrderInput, NewOrderLine, OrderService, OrderView};
pub use services::reconciliation::ReconciliationService;
