use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::info;

use gasflow_core::{DomainError, DomainResult, Location, OrderId, PlanId, ReconciliationId};
use gasflow_reconciliation::{
    compare_vehicle_count, DailyReconciliation, VehicleCountLine, VehicleCountReport,
};

use crate::ledger::SharedLedger;
use crate::order_store::OrderStore;
use crate::registry::ExchangeRegistry;

/// End-of-day reconciliation over a plan: variance roll-up plus the
/// independent vehicle count.
#[derive(Debug, Clone)]
pub struct ReconciliationService {
    ledger: Arc<SharedLedger>,
    orders: Arc<OrderStore>,
    exchanges: Arc<ExchangeRegistry>,
    reports: Arc<RwLock<HashMap<ReconciliationId, DailyReconciliation>>>,
    counts: Arc<RwLock<Vec<VehicleCountReport>>>,
}

impl ReconciliationService {
    pub fn new(
        ledger: Arc<SharedLedger>,
        orders: Arc<OrderStore>,
        exchanges: Arc<ExchangeRegistry>,
    ) -> Self {
        Self {
            ledger,
            orders,
            exchanges,
            reports: Arc::new(RwLock::new(HashMap::new())),
            counts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn plan_order_ids(&self, plan_id: PlanId) -> DomainResult<Vec<OrderId>> {
        let orders = self.orders.by_plan(plan_id)?;
        if orders.is_empty() {
            return Err(DomainError::not_found(format!("orders for plan {plan_id}")));
        }
        Ok(orders.iter().map(|o| o.id_typed()).collect())
    }

    /// Aggregate every exchange of the plan's orders into a daily row.
    pub fn create_daily(
        &self,
        plan_id: PlanId,
        reconciled_by: &str,
        notes: Option<String>,
    ) -> DomainResult<DailyReconciliation> {
        let order_ids = self.plan_order_ids(plan_id)?;
        let exchanges = self.exchanges.for_orders(&order_ids)?;

        let reconciliation = DailyReconciliation::create(
            ReconciliationId::new(),
            plan_id,
            reconciled_by,
            notes,
            &exchanges,
            Utc::now(),
        );
        let summary = reconciliation.summary();
        info!(
            plan_id = %plan_id,
            reconciliation_id = %reconciliation.id(),
            total_orders = summary.total_orders,
            total_shortages = summary.total_shortages,
            total_excess = summary.total_excess,
            "daily reconciliation created"
        );

        self.reports
            .write()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?
            .insert(reconciliation.id(), reconciliation.clone());
        Ok(reconciliation)
    }

    pub fn close(&self, id: ReconciliationId) -> DomainResult<DailyReconciliation> {
        let mut reports = self
            .reports
            .write()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?;
        let reconciliation = reports
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("reconciliation {id}")))?;
        reconciliation.close(Utc::now())?;
        Ok(reconciliation.clone())
    }

    pub fn get(&self, id: ReconciliationId) -> DomainResult<DailyReconciliation> {
        self.reports
            .read()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("reconciliation {id}")))
    }

    pub fn list(&self) -> DomainResult<Vec<DailyReconciliation>> {
        let mut reports: Vec<DailyReconciliation> = self
            .reports
            .read()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?
            .values()
            .cloned()
            .collect();
        reports.sort_by_key(|r| r.created_at());
        Ok(reports)
    }

    /// Independent physical count of what remains on the plan's vehicle,
    /// compared against the ledger-derived balances at that vehicle.
    pub fn count_vehicle_inventory(
        &self,
        plan_id: PlanId,
        items: Vec<VehicleCountLine>,
    ) -> DomainResult<VehicleCountReport> {
        let orders = self.orders.by_plan(plan_id)?;
        let vehicle_id = orders
            .iter()
            .find_map(|o| o.vehicle_id())
            .ok_or_else(|| DomainError::not_found(format!("vehicle for plan {plan_id}")))?;

        let expected = self
            .ledger
            .location_totals_by_type(&Location::vehicle(vehicle_id))?;
        let report = compare_vehicle_count(plan_id, &expected, &items, Utc::now())?;
        info!(
            plan_id = %plan_id,
            vehicle_id = %vehicle_id,
            discrepancies = report.discrepancies.len(),
            "vehicle inventory counted"
        );

        self.counts
            .write()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?
            .push(report.clone());
        Ok(report)
    }

    pub fn count_reports(&self) -> DomainResult<Vec<VehicleCountReport>> {
        Ok(self
            .counts
            .read()
            .map_err(|_| DomainError::conflict("reconciliation store lock poisoned"))?
            .clone())
    }
}
