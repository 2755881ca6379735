pub mod exchange;
pub mod orders;
pub mod reconciliation;
