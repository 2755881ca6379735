//! Independent end-of-day physical count of what remains on a vehicle.
//!
//! The expected figures come from the ledger, but the comparison itself is a
//! second check against a human count. It exists to catch real-world loss and
//! bookkeeping bugs the movement-based invariant cannot see, so it must never
//! be reduced to recomputing both sides from the ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gasflow_core::{CylinderTypeId, DomainError, DomainResult, PlanId};

/// One counted line of the physical check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCountLine {
    pub cylinder_type_id: CylinderTypeId,
    pub actual_remaining: i64,
    /// Required whenever the count disagrees with the ledger.
    pub variance_reason: Option<String>,
}

/// A line where the physical count disagreed with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDiscrepancy {
    pub cylinder_type_id: CylinderTypeId,
    pub expected_remaining: i64,
    pub actual_remaining: i64,
    /// actual − expected; negative means cylinders are missing.
    pub variance: i64,
    pub reason: String,
}

/// Outcome of one plan's vehicle count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCountReport {
    pub plan_id: PlanId,
    pub discrepancies: Vec<CountDiscrepancy>,
    pub counted_at: DateTime<Utc>,
}

impl VehicleCountReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Compare counted lines against ledger-derived expected remainders.
///
/// Lines the counter did not report are compared as if counted; a cylinder
/// type expected on the vehicle but absent from `items` is treated as counted
/// at zero and needs a reason like any other mismatch. Fails without
/// recording anything if any mismatching line lacks a reason.
pub fn compare_vehicle_count(
    plan_id: PlanId,
    expected: &BTreeMap<CylinderTypeId, i64>,
    items: &[VehicleCountLine],
    counted_at: DateTime<Utc>,
) -> DomainResult<VehicleCountReport> {
    let mut discrepancies = Vec::new();
    let mut counted = BTreeMap::new();

    for item in items {
        if item.actual_remaining < 0 {
            return Err(DomainError::validation(
                "counted quantity must be non-negative",
            ));
        }
        counted.insert(item.cylinder_type_id, item);
        let expected_remaining = expected.get(&item.cylinder_type_id).copied().unwrap_or(0);
        if let Some(discrepancy) =
            discrepancy_for(item, expected_remaining, item.actual_remaining)?
        {
            discrepancies.push(discrepancy);
        }
    }

    for (&cylinder_type_id, &expected_remaining) in expected {
        if expected_remaining != 0 && !counted.contains_key(&cylinder_type_id) {
            return Err(DomainError::validation(format!(
                "cylinder type {cylinder_type_id} expected on the vehicle was not counted; count it (even at zero) with a variance reason"
            )));
        }
    }

    Ok(VehicleCountReport {
        plan_id,
        discrepancies,
        counted_at,
    })
}

fn discrepancy_for(
    item: &VehicleCountLine,
    expected_remaining: i64,
    actual_remaining: i64,
) -> DomainResult<Option<CountDiscrepancy>> {
    if actual_remaining == expected_remaining {
        return Ok(None);
    }
    let reason = item
        .variance_reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            DomainError::validation(format!(
                "count for cylinder type {} disagrees with the ledger (expected {expected_remaining}, counted {actual_remaining}) and needs a variance reason",
                item.cylinder_type_id
            ))
        })?;
    Ok(Some(CountDiscrepancy {
        cylinder_type_id: item.cylinder_type_id,
        expected_remaining,
        actual_remaining,
        variance: actual_remaining - expected_remaining,
        reason: reason.to_owned(),
    }))
}
