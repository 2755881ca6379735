//! Cylinder inventory store + movement ledger.
//!
//! Balances exist per (cylinder type, location, status) key and change
//! **only** by applying movements; the movement log is append-only and is the
//! audit trail of the system.

pub mod ledger;
pub mod movement;
pub mod record;

pub use ledger::{CompoundGuard, InitEntry, LedgerState, VersionGuard};
pub use movement::{Movement, MovementFilter, MovementRequest, MovementType, StockPoint};
pub use record::{DashboardRow, InventoryFilter, InventoryKey, InventoryRecord};
