use std::collections::BTreeMap;
use std::sync::RwLock;

use gasflow_core::{CylinderTypeId, DomainError, DomainResult, Location};
use gasflow_inventory::{
    CompoundGuard, DashboardRow, InitEntry, InventoryFilter, InventoryKey, InventoryRecord,
    LedgerState, Movement, MovementFilter, MovementRequest, VersionGuard,
};

/// Thread-safe wrapper over the ledger.
///
/// Each method takes the lock for the duration of one ledger call, so single
/// movements and compound applies are atomic with respect to each other.
/// Callers coordinating a pre-check with a later compound apply use
/// [`SharedLedger::guards_for`] and let version guards surface interleavings.
#[derive(Debug, Default)]
pub struct SharedLedger {
    state: RwLock<LedgerState>,
}

impl SharedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| DomainError::conflict("ledger lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| DomainError::conflict("ledger lock poisoned"))
    }

    pub fn apply(&self, request: MovementRequest) -> DomainResult<Movement> {
        self.write()?.apply(request)
    }

    pub fn apply_compound(
        &self,
        legs: Vec<MovementRequest>,
        guard: CompoundGuard,
    ) -> DomainResult<Vec<Movement>> {
        self.write()?.apply_compound(legs, guard)
    }

    pub fn initialize(
        &self,
        location: Location,
        entries: Vec<InitEntry>,
        actor: impl Into<String>,
    ) -> DomainResult<Vec<Movement>> {
        self.write()?.initialize(location, entries, actor)
    }

    pub fn available_quantity(&self, key: &InventoryKey) -> DomainResult<i64> {
        Ok(self.read()?.available_quantity(key))
    }

    pub fn guards_for(
        &self,
        keys: impl IntoIterator<Item = InventoryKey>,
    ) -> DomainResult<Vec<VersionGuard>> {
        Ok(self.read()?.guards_for(keys))
    }

    pub fn query(&self, filter: &InventoryFilter) -> DomainResult<Vec<InventoryRecord>> {
        Ok(self.read()?.query(filter))
    }

    pub fn dashboard(&self) -> DomainResult<Vec<DashboardRow>> {
        Ok(self.read()?.dashboard())
    }

    pub fn movements(&self, filter: &MovementFilter) -> DomainResult<Vec<Movement>> {
        Ok(self.read()?.movements(filter))
    }

    /// Per-type balances at one location, ordered for stable comparison.
    pub fn location_totals_by_type(
        &self,
        location: &Location,
    ) -> DomainResult<BTreeMap<CylinderTypeId, i64>> {
        Ok(self
            .read()?
            .location_totals_by_type(location)
            .into_iter()
            .collect())
    }
}
