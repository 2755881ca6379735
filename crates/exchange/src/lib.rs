//! Delivery-exchange verification: filled delivered vs. empty returned.

pub mod allocation;
pub mod plan;
pub mod tracking;
pub mod variance;

pub use allocation::{allocate_expected_shares, allocate_line_returns};
pub use plan::{
    build_delivery_movements, check_customer_stock, CustomerStock, ExchangeLine,
    ReturnDestination,
};
pub use tracking::ExchangeTracking;
pub use variance::{classify_variance, validate_variance_reason, VarianceType};
