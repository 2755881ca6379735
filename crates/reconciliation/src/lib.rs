//! End-of-day reconciliation: variance roll-up per dispatch plan, plus an
//! independent physical count of what remains on the vehicle.

pub mod count;
pub mod daily;

pub use count::{compare_vehicle_count, CountDiscrepancy, VehicleCountLine, VehicleCountReport};
pub use daily::{summarize_exchanges, DailyReconciliation, ReconciliationStatus, VarianceSummary};
