//! `gasflow-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod cylinder;
pub mod error;
pub mod id;
pub mod location;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use cylinder::CylinderStatus;
pub use error::{DomainError, DomainResult};
pub use id::{
    CustomerId, CylinderTypeId, ExchangeId, MovementId, OrderId, PlanId, ReconciliationId,
    VehicleId,
};
pub use location::{Location, LocationType};
