//! Domain error model.

use thiserror::Error;

use crate::id::CylinderTypeId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
///
/// Stock failures carry the numbers the UI needs (`needed`, `available`) so
/// callers can render precise shortage detail without re-deriving it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or missing input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A movement would overdraw its source balance.
    #[error(
        "insufficient inventory for cylinder type {cylinder_type_id}: needed {needed}, available {available}"
    )]
    InsufficientInventory {
        cylinder_type_id: CylinderTypeId,
        needed: i64,
        available: i64,
    },

    /// Exchange verification pre-check failed: the customer cannot cover the
    /// expected empty return for a line.
    #[error(
        "insufficient customer stock for cylinder type {cylinder_type_id}: needed {needed}, available {available}"
    )]
    InsufficientCustomerStock {
        cylinder_type_id: CylinderTypeId,
        needed: i64,
        available: i64,
    },

    /// An illegal order lifecycle transition (or a missing precondition for one).
    #[error("state transition rejected: {0}")]
    StateTransition(String),

    /// An optimistic-concurrency loss on an inventory key or event stream.
    /// The caller must retry the whole operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_inventory(
        cylinder_type_id: CylinderTypeId,
        needed: i64,
        available: i64,
    ) -> Self {
        Self::InsufficientInventory {
            cylinder_type_id,
            needed,
            available,
        }
    }

    pub fn insufficient_customer_stock(
        cylinder_type_id: CylinderTypeId,
        needed: i64,
        available: i64,
    ) -> Self {
        Self::InsufficientCustomerStock {
            cylinder_type_id,
            needed,
            available,
        }
    }

    pub fn state_transition(msg: impl Into<String>) -> Self {
        Self::StateTransition(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
