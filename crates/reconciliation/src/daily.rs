use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gasflow_core::{DomainError, DomainResult, PlanId, ReconciliationId};
use gasflow_exchange::{ExchangeTracking, VarianceType};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    Open,
    Closed,
}

impl ReconciliationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconciliationStatus::Open => "OPEN",
            ReconciliationStatus::Closed => "CLOSED",
        }
    }
}

impl core::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variance roll-up over the exchanges of one plan's day.
///
/// Shortages are summed as absolute quantities, excess as-is; a day with both
/// reports both totals rather than a net.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceSummary {
    pub total_orders: u64,
    pub total_shortages: i64,
    pub total_excess: i64,
}

pub fn summarize_exchanges(exchanges: &[ExchangeTracking]) -> VarianceSummary {
    let mut summary = VarianceSummary {
        total_orders: exchanges.len() as u64,
        ..VarianceSummary::default()
    };
    for exchange in exchanges {
        match exchange.variance_type() {
            VarianceType::Shortage => summary.total_shortages += exchange.variance_qty().abs(),
            VarianceType::Excess => summary.total_excess += exchange.variance_qty(),
            VarianceType::Match => {}
        }
    }
    summary
}

/// One plan's daily reconciliation row. Starts OPEN; closing it is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReconciliation {
    id: ReconciliationId,
    plan_id: PlanId,
    reconciled_by: String,
    notes: Option<String>,
    summary: VarianceSummary,
    status: ReconciliationStatus,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl DailyReconciliation {
    pub fn create(
        id: ReconciliationId,
        plan_id: PlanId,
        reconciled_by: impl Into<String>,
        notes: Option<String>,
        exchanges: &[ExchangeTracking],
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            plan_id,
            reconciled_by: reconciled_by.into(),
            notes,
            summary: summarize_exchanges(exchanges),
            status: ReconciliationStatus::Open,
            created_at,
            closed_at: None,
        }
    }

    pub fn close(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status == ReconciliationStatus::Closed {
            return Err(DomainError::state_transition(format!(
                "reconciliation {} is already closed",
                self.id
            )));
        }
        self.status = ReconciliationStatus::Closed;
        self.closed_at = Some(at);
        Ok(())
    }

    pub fn id(&self) -> ReconciliationId {
        self.id
    }

    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    pub fn reconciled_by(&self) -> &str {
        &self.reconciled_by
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn summary(&self) -> VarianceSummary {
        self.summary
    }

    pub fn status(&self) -> ReconciliationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
}
