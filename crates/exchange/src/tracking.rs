use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gasflow_core::{DomainError, DomainResult, ExchangeId, OrderId};

use crate::variance::{classify_variance, validate_variance_reason, VarianceType};

/// The filled-for-empty swap verified at a delivery stop.
///
/// At most one active record exists per order; its presence is the gate that
/// unlocks the order's DELIVERED transition. Immutable after creation except
/// for the customer acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeTracking {
    id: ExchangeId,
    order_id: OrderId,
    filled_delivered: i64,
    empty_collected: i64,
    expected_empty: i64,
    variance_qty: i64,
    variance_type: VarianceType,
    variance_reason: Option<String>,
    customer_acknowledged: bool,
    acknowledged_by: Option<String>,
    acknowledged_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExchangeTracking {
    /// Build a verified exchange record.
    ///
    /// Computes `variance_qty = empty_collected − expected_empty` and rejects
    /// a non-zero variance without a reason.
    pub fn record(
        id: ExchangeId,
        order_id: OrderId,
        filled_delivered: i64,
        empty_collected: i64,
        expected_empty: i64,
        variance_reason: Option<String>,
        customer_acknowledged: bool,
        notes: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if filled_delivered < 0 || empty_collected < 0 || expected_empty < 0 {
            return Err(DomainError::validation(
                "exchange counts must be non-negative",
            ));
        }
        let variance_qty = empty_collected - expected_empty;
        validate_variance_reason(variance_qty, variance_reason.as_deref())?;
        let variance_reason = variance_reason
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());
        Ok(Self {
            id,
            order_id,
            filled_delivered,
            empty_collected,
            expected_empty,
            variance_qty,
            variance_type: classify_variance(variance_qty),
            variance_reason,
            customer_acknowledged,
            acknowledged_by: None,
            acknowledged_at: None,
            notes,
            created_at,
        })
    }

    /// Record the customer's sign-off after the fact.
    pub fn acknowledge(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        self.customer_acknowledged = true;
        self.acknowledged_by = Some(by.into());
        self.acknowledged_at = Some(at);
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn filled_delivered(&self) -> i64 {
        self.filled_delivered
    }

    pub fn empty_collected(&self) -> i64 {
        self.empty_collected
    }

    pub fn expected_empty(&self) -> i64 {
        self.expected_empty
    }

    pub fn variance_qty(&self) -> i64 {
        self.variance_qty
    }

    pub fn variance_type(&self) -> VarianceType {
        self.variance_type
    }

    pub fn variance_reason(&self) -> Option<&str> {
        self.variance_reason.as_deref()
    }

    pub fn customer_acknowledged(&self) -> bool {
        self.customer_acknowledged
    }

    pub fn acknowledged_by(&self) -> Option<&str> {
        self.acknowledged_by.as_deref()
    }

    pub fn acknowledged_at(&self) -> Option<DateTime<Utc>> {
        self.acknowledged_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
