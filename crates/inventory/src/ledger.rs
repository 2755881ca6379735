use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use gasflow_core::{
    CylinderStatus, CylinderTypeId, DomainError, DomainResult, Location, LocationType, MovementId,
};

use crate::movement::{Movement, MovementFilter, MovementRequest, MovementType, StockPoint};
use crate::record::{DashboardRow, InventoryFilter, InventoryKey, InventoryRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Balance {
    quantity: i64,
    version: u64,
}

/// Expected version of one inventory key, captured at pre-check time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VersionGuard {
    pub key: InventoryKey,
    pub version: u64,
}

/// Commit guard for a compound (multi-leg) movement.
///
/// `reference_transaction_id` doubles as the idempotency key: re-submitting a
/// compound that already committed returns the originally recorded movements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundGuard {
    pub reference_transaction_id: Uuid,
    pub expected: Vec<VersionGuard>,
}

/// One seed entry for `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitEntry {
    pub cylinder_type_id: CylinderTypeId,
    pub quantity: i64,
    pub status: CylinderStatus,
}

/// Inventory balances + the append-only movement ledger.
///
/// Balances change only through [`LedgerState::apply`],
/// [`LedgerState::apply_compound`] and [`LedgerState::initialize`]; every
/// mutation appends the movement that caused it. Methods take `&mut self`, so
/// each call is atomic with respect to any shared wrapper serializing access.
#[derive(Debug, Default)]
pub struct LedgerState {
    balances: HashMap<InventoryKey, Balance>,
    movements: Vec<Movement>,
    /// reference_transaction_id -> movements committed under it.
    compounds: HashMap<Uuid, Vec<MovementId>>,
    /// Keys seeded by INITIALIZATION; re-seeding them is rejected.
    initialized: HashSet<InventoryKey>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance at a key. Never negative; zero for unseen keys.
    pub fn available_quantity(&self, key: &InventoryKey) -> i64 {
        self.balances.get(key).map(|b| b.quantity).unwrap_or(0)
    }

    /// Optimistic-concurrency version of a key (0 for unseen keys).
    pub fn version_of(&self, key: &InventoryKey) -> u64 {
        self.balances.get(key).map(|b| b.version).unwrap_or(0)
    }

    /// Capture version guards for a set of keys (pre-check snapshot).
    pub fn guards_for(&self, keys: impl IntoIterator<Item = InventoryKey>) -> Vec<VersionGuard> {
        keys.into_iter()
            .map(|key| VersionGuard {
                key,
                version: self.version_of(&key),
            })
            .collect()
    }

    /// Read-only record listing for dashboards; no invariant risk.
    pub fn query(&self, filter: &InventoryFilter) -> Vec<InventoryRecord> {
        let mut records: Vec<InventoryRecord> = self
            .balances
            .iter()
            .filter(|(key, _)| filter.matches(key))
            .map(|(key, balance)| InventoryRecord {
                key: *key,
                quantity: balance.quantity,
                version: balance.version,
            })
            .collect();
        records.sort_by(|a, b| {
            (a.key.location_type, a.key.cylinder_type_id, a.key.status)
                .cmp(&(b.key.location_type, b.key.cylinder_type_id, b.key.status))
        });
        records
    }

    /// Aggregate totals by (location type, status).
    pub fn dashboard(&self) -> Vec<DashboardRow> {
        let mut totals: BTreeMap<(LocationType, CylinderStatus), i64> = BTreeMap::new();
        for (key, balance) in &self.balances {
            *totals.entry((key.location_type, key.status)).or_insert(0) += balance.quantity;
        }
        totals
            .into_iter()
            .map(|((location_type, status), total_quantity)| DashboardRow {
                location_type,
                status,
                total_quantity,
            })
            .collect()
    }

    /// The recorded ledger (append-only audit trail).
    pub fn movements(&self, filter: &MovementFilter) -> Vec<Movement> {
        self.movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect()
    }

    /// Total tracked quantity of one cylinder type across every key.
    /// Invariant under all non-INITIALIZATION/ADJUSTMENT movements.
    pub fn total_quantity(&self, cylinder_type_id: CylinderTypeId) -> i64 {
        self.balances
            .iter()
            .filter(|(key, _)| key.cylinder_type_id == cylinder_type_id)
            .map(|(_, b)| b.quantity)
            .sum()
    }

    /// Current per-type balances at one location (both statuses summed),
    /// used by the end-of-day vehicle count as the ledger-derived expectation.
    pub fn location_totals_by_type(&self, location: &Location) -> HashMap<CylinderTypeId, i64> {
        let mut totals = HashMap::new();
        for (key, balance) in &self.balances {
            if key.location_type == location.location_type()
                && key.reference_id == location.reference_id()
            {
                *totals.entry(key.cylinder_type_id).or_insert(0) += balance.quantity;
            }
        }
        totals
    }

    /// Apply a single movement: validate, debit source, credit destination,
    /// append to the ledger — one atomic unit.
    pub fn apply(&mut self, request: MovementRequest) -> DomainResult<Movement> {
        request.validate()?;
        self.check_source(&request)?;
        Ok(self.commit(request))
    }

    /// Apply a multi-leg compound movement all-or-nothing.
    ///
    /// Every leg is validated against a staged view of the balances before
    /// anything commits, so a failing leg leaves no observable partial state.
    /// Version guards captured at pre-check time surface interleaved writers
    /// as `Conflict`; the caller retries the whole compound, and a retry after
    /// a successful commit replays idempotently.
    pub fn apply_compound(
        &mut self,
        legs: Vec<MovementRequest>,
        guard: CompoundGuard,
    ) -> DomainResult<Vec<Movement>> {
        if legs.is_empty() {
            return Err(DomainError::validation("compound movement needs legs"));
        }

        // Idempotent replay of an already-committed compound.
        if let Some(ids) = self.compounds.get(&guard.reference_transaction_id) {
            let ids: HashSet<MovementId> = ids.iter().copied().collect();
            return Ok(self
                .movements
                .iter()
                .filter(|m| ids.contains(&m.id))
                .cloned()
                .collect());
        }

        for expected in &guard.expected {
            let actual = self.version_of(&expected.key);
            if actual != expected.version {
                return Err(DomainError::conflict(format!(
                    "inventory key {:?} moved from version {} to {} since pre-check",
                    expected.key, expected.version, actual
                )));
            }
        }

        // Stage: validate every leg against a scratch copy of the balances.
        let mut staged: HashMap<InventoryKey, i64> = HashMap::new();
        for leg in &legs {
            leg.validate()?;
            if let Some(source) = &leg.source {
                let key = InventoryKey::from_point(leg.cylinder_type_id, source);
                let current = self.available_quantity(&key);
                let available = staged.entry(key).or_insert(current);
                if *available < leg.quantity {
                    return Err(DomainError::insufficient_inventory(
                        leg.cylinder_type_id,
                        leg.quantity,
                        *available,
                    ));
                }
                *available -= leg.quantity;
            }
            let dest = InventoryKey::from_point(leg.cylinder_type_id, &leg.destination);
            let current = self.available_quantity(&dest);
            *staged.entry(dest).or_insert(current) += leg.quantity;
        }

        // Commit: every leg carries the compound's reference id.
        let mut recorded = Vec::with_capacity(legs.len());
        for mut leg in legs {
            leg.reference_transaction_id = Some(guard.reference_transaction_id);
            recorded.push(self.commit(leg));
        }
        self.compounds.insert(
            guard.reference_transaction_id,
            recorded.iter().map(|m| m.id).collect(),
        );
        Ok(recorded)
    }

    /// Seed starting stock at a location.
    ///
    /// Explicit contract: a (cylinder type, location, status) key may be
    /// seeded once. Re-initializing any entry's key fails with `Validation`
    /// and nothing is applied; later corrections go through ADJUSTMENT.
    pub fn initialize(
        &mut self,
        location: Location,
        entries: Vec<InitEntry>,
        actor: impl Into<String>,
    ) -> DomainResult<Vec<Movement>> {
        if entries.is_empty() {
            return Err(DomainError::validation("initialize needs at least one entry"));
        }
        let actor = actor.into();

        let mut requests = Vec::with_capacity(entries.len());
        for entry in entries {
            let destination = StockPoint::new(location, entry.status);
            let request = MovementRequest {
                cylinder_type_id: entry.cylinder_type_id,
                source: None,
                destination,
                quantity: entry.quantity,
                movement_type: MovementType::Initialization,
                reference_transaction_id: None,
                actor: actor.clone(),
                notes: None,
            };
            request.validate()?;
            let key = InventoryKey::from_point(entry.cylinder_type_id, &destination);
            if self.initialized.contains(&key) {
                return Err(DomainError::validation(format!(
                    "inventory key already initialized: {} {} at {}",
                    entry.cylinder_type_id, entry.status, location
                )));
            }
            requests.push((key, request));
        }

        let mut recorded = Vec::with_capacity(requests.len());
        for (key, request) in requests {
            self.initialized.insert(key);
            recorded.push(self.commit(request));
        }
        Ok(recorded)
    }

    fn check_source(&self, request: &MovementRequest) -> DomainResult<()> {
        if let Some(source) = &request.source {
            let key = InventoryKey::from_point(request.cylinder_type_id, source);
            let available = self.available_quantity(&key);
            if available < request.quantity {
                return Err(DomainError::insufficient_inventory(
                    request.cylinder_type_id,
                    request.quantity,
                    available,
                ));
            }
        }
        Ok(())
    }

    /// Mutate balances and append the movement. Callers must have validated.
    fn commit(&mut self, request: MovementRequest) -> Movement {
        if let Some(source) = &request.source {
            let key = InventoryKey::from_point(request.cylinder_type_id, source);
            let balance = self.balances.entry(key).or_default();
            balance.quantity -= request.quantity;
            balance.version += 1;
        }
        let dest = InventoryKey::from_point(request.cylinder_type_id, &request.destination);
        let balance = self.balances.entry(dest).or_default();
        balance.quantity += request.quantity;
        balance.version += 1;

        let movement = Movement {
            id: MovementId::new(),
            cylinder_type_id: request.cylinder_type_id,
            source: request.source,
            destination: request.destination,
            quantity: request.quantity,
            movement_type: request.movement_type,
            reference_transaction_id: request.reference_transaction_id,
            actor: request.actor,
            notes: request.notes,
            recorded_at: Utc::now(),
        };
        self.movements.push(movement.clone());
        movement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasflow_core::{CustomerId, VehicleId};
    use proptest::prelude::*;

    fn transfer(
        cylinder_type_id: CylinderTypeId,
        from: StockPoint,
        to: StockPoint,
        quantity: i64,
    ) -> MovementRequest {
        MovementRequest {
            cylinder_type_id,
            source: Some(from),
            destination: to,
            quantity,
            movement_type: MovementType::Transfer,
            reference_transaction_id: None,
            actor: "tester".to_string(),
            notes: None,
        }
    }

    fn seeded_ledger(
        cylinder_type_id: CylinderTypeId,
        location: Location,
        status: CylinderStatus,
        quantity: i64,
    ) -> LedgerState {
        let mut ledger = LedgerState::new();
        ledger
            .initialize(
                location,
                vec![InitEntry {
                    cylinder_type_id,
                    quantity,
                    status,
                }],
                "seed",
            )
            .unwrap();
        ledger
    }

    #[test]
    fn apply_rejects_non_positive_quantity() {
        let mut ledger = LedgerState::new();
        let ct = CylinderTypeId::new();
        let req = transfer(
            ct,
            StockPoint::new(Location::yard(), CylinderStatus::Filled),
            StockPoint::new(Location::plant(), CylinderStatus::Filled),
            0,
        );
        let err = ledger.apply(req).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_external_movement_requires_source() {
        let mut ledger = LedgerState::new();
        let ct = CylinderTypeId::new();
        let req = MovementRequest {
            cylinder_type_id: ct,
            source: None,
            destination: StockPoint::new(Location::yard(), CylinderStatus::Filled),
            quantity: 5,
            movement_type: MovementType::Transfer,
            reference_transaction_id: None,
            actor: "tester".to_string(),
            notes: None,
        };
        let err = ledger.apply(req).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overdraw_fails_structured_and_leaves_balances_unchanged() {
        let ct = CylinderTypeId::new();
        let yard = StockPoint::new(Location::yard(), CylinderStatus::Filled);
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 3);

        let err = ledger
            .apply(transfer(
                ct,
                yard,
                StockPoint::new(Location::plant(), CylinderStatus::Filled),
                10,
            ))
            .unwrap_err();
        match err {
            DomainError::InsufficientInventory {
                cylinder_type_id,
                needed,
                available,
            } => {
                assert_eq!(cylinder_type_id, ct);
                assert_eq!(needed, 10);
                assert_eq!(available, 3);
            }
            other => panic!("expected InsufficientInventory, got {other:?}"),
        }
        assert_eq!(
            ledger.available_quantity(&InventoryKey::from_point(ct, &yard)),
            3
        );
        assert_eq!(ledger.movements(&MovementFilter::default()).len(), 1);
    }

    #[test]
    fn apply_moves_quantity_and_bumps_versions() {
        let ct = CylinderTypeId::new();
        let vehicle = VehicleId::new();
        let yard = StockPoint::new(Location::yard(), CylinderStatus::Filled);
        let truck = StockPoint::new(Location::vehicle(vehicle), CylinderStatus::Filled);
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 50);

        ledger.apply(transfer(ct, yard, truck, 20)).unwrap();

        let yard_key = InventoryKey::from_point(ct, &yard);
        let truck_key = InventoryKey::from_point(ct, &truck);
        assert_eq!(ledger.available_quantity(&yard_key), 30);
        assert_eq!(ledger.available_quantity(&truck_key), 20);
        // Seed write + transfer debit.
        assert_eq!(ledger.version_of(&yard_key), 2);
        assert_eq!(ledger.version_of(&truck_key), 1);
    }

    #[test]
    fn compound_is_all_or_nothing() {
        let ct = CylinderTypeId::new();
        let customer = CustomerId::new();
        let cust_filled = StockPoint::new(Location::customer(customer), CylinderStatus::Filled);
        let cust_empty = StockPoint::new(Location::customer(customer), CylinderStatus::Empty);
        let yard_empty = StockPoint::new(Location::yard(), CylinderStatus::Empty);
        let mut ledger = seeded_ledger(ct, Location::customer(customer), CylinderStatus::Filled, 5);

        let before = ledger.total_quantity(ct);
        let legs = vec![
            // Converts 5, then tries to return 10 empties: second leg must sink the whole compound.
            transfer(ct, cust_filled, cust_empty, 5),
            transfer(ct, cust_empty, yard_empty, 10),
        ];
        let guard = CompoundGuard {
            reference_transaction_id: Uuid::now_v7(),
            expected: vec![],
        };
        let err = ledger.apply_compound(legs, guard).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientInventory { .. }));

        assert_eq!(
            ledger.available_quantity(&InventoryKey::from_point(ct, &cust_filled)),
            5
        );
        assert_eq!(
            ledger.available_quantity(&InventoryKey::from_point(ct, &cust_empty)),
            0
        );
        assert_eq!(ledger.total_quantity(ct), before);
        assert_eq!(ledger.movements(&MovementFilter::default()).len(), 1);
    }

    #[test]
    fn compound_replays_idempotently() {
        let ct = CylinderTypeId::new();
        let yard = StockPoint::new(Location::yard(), CylinderStatus::Filled);
        let plant = StockPoint::new(Location::plant(), CylinderStatus::Filled);
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 40);

        let reference = Uuid::now_v7();
        let guard = CompoundGuard {
            reference_transaction_id: reference,
            expected: vec![],
        };
        let first = ledger
            .apply_compound(vec![transfer(ct, yard, plant, 15)], guard.clone())
            .unwrap();

        // Same reference id: no double-apply, same recorded movements.
        let replay = ledger
            .apply_compound(vec![transfer(ct, yard, plant, 15)], guard)
            .unwrap();
        assert_eq!(first, replay);
        assert_eq!(
            ledger.available_quantity(&InventoryKey::from_point(ct, &yard)),
            25
        );
    }

    #[test]
    fn stale_version_guard_conflicts() {
        let ct = CylinderTypeId::new();
        let yard = StockPoint::new(Location::yard(), CylinderStatus::Filled);
        let plant = StockPoint::new(Location::plant(), CylinderStatus::Filled);
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 40);

        let yard_key = InventoryKey::from_point(ct, &yard);
        let guards = ledger.guards_for([yard_key]);

        // Interleaved writer touches the key between pre-check and commit.
        ledger.apply(transfer(ct, yard, plant, 1)).unwrap();

        let err = ledger
            .apply_compound(
                vec![transfer(ct, yard, plant, 5)],
                CompoundGuard {
                    reference_transaction_id: Uuid::now_v7(),
                    expected: guards,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn reinitializing_a_seeded_key_is_rejected() {
        let ct = CylinderTypeId::new();
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 10);

        let err = ledger
            .initialize(
                Location::yard(),
                vec![InitEntry {
                    cylinder_type_id: ct,
                    quantity: 10,
                    status: CylinderStatus::Filled,
                }],
                "seed",
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        // Not silently double-seeded.
        let key = InventoryKey::from_point(
            ct,
            &StockPoint::new(Location::yard(), CylinderStatus::Filled),
        );
        assert_eq!(ledger.available_quantity(&key), 10);
    }

    #[test]
    fn initialize_is_atomic_across_entries() {
        let ct = CylinderTypeId::new();
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 10);

        // Second batch: one fresh key, one already-seeded key. Nothing applies.
        let err = ledger
            .initialize(
                Location::yard(),
                vec![
                    InitEntry {
                        cylinder_type_id: ct,
                        quantity: 4,
                        status: CylinderStatus::Empty,
                    },
                    InitEntry {
                        cylinder_type_id: ct,
                        quantity: 4,
                        status: CylinderStatus::Filled,
                    },
                ],
                "seed",
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let empty_key = InventoryKey::from_point(
            ct,
            &StockPoint::new(Location::yard(), CylinderStatus::Empty),
        );
        assert_eq!(ledger.available_quantity(&empty_key), 0);
    }

    #[test]
    fn dashboard_aggregates_by_location_type_and_status() {
        let ct_a = CylinderTypeId::new();
        let ct_b = CylinderTypeId::new();
        let mut ledger = LedgerState::new();
        ledger
            .initialize(
                Location::yard(),
                vec![
                    InitEntry {
                        cylinder_type_id: ct_a,
                        quantity: 10,
                        status: CylinderStatus::Filled,
                    },
                    InitEntry {
                        cylinder_type_id: ct_b,
                        quantity: 7,
                        status: CylinderStatus::Filled,
                    },
                    InitEntry {
                        cylinder_type_id: ct_a,
                        quantity: 3,
                        status: CylinderStatus::Empty,
                    },
                ],
                "seed",
            )
            .unwrap();

        let rows = ledger.dashboard();
        let filled = rows
            .iter()
            .find(|r| r.location_type == LocationType::Yard && r.status == CylinderStatus::Filled)
            .unwrap();
        assert_eq!(filled.total_quantity, 17);
        let empty = rows
            .iter()
            .find(|r| r.location_type == LocationType::Yard && r.status == CylinderStatus::Empty)
            .unwrap();
        assert_eq!(empty.total_quantity, 3);
    }

    #[test]
    fn query_filters_by_reference() {
        let ct = CylinderTypeId::new();
        let vehicle = VehicleId::new();
        let yard = StockPoint::new(Location::yard(), CylinderStatus::Filled);
        let truck = StockPoint::new(Location::vehicle(vehicle), CylinderStatus::Filled);
        let mut ledger = seeded_ledger(ct, Location::yard(), CylinderStatus::Filled, 50);
        ledger.apply(transfer(ct, yard, truck, 20)).unwrap();

        let records = ledger.query(&InventoryFilter {
            location_type: Some(LocationType::Vehicle),
            reference_id: Some(*vehicle.as_uuid()),
            ..Default::default()
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 20);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of internal transfers (whether they
        /// succeed or overdraw and fail), the total quantity of a cylinder
        /// type across every (location, status) key never changes, and no
        /// balance ever goes negative.
        #[test]
        fn transfers_conserve_total_quantity(
            moves in prop::collection::vec((0usize..4, 0usize..4, 1i64..30), 1..40)
        ) {
            let ct = CylinderTypeId::new();
            let vehicle = VehicleId::new();
            let customer = CustomerId::new();
            let points = [
                StockPoint::new(Location::yard(), CylinderStatus::Filled),
                StockPoint::new(Location::yard(), CylinderStatus::Empty),
                StockPoint::new(Location::vehicle(vehicle), CylinderStatus::Filled),
                StockPoint::new(Location::customer(customer), CylinderStatus::Empty),
            ];

            let mut ledger = LedgerState::new();
            ledger.initialize(
                Location::yard(),
                vec![
                    InitEntry { cylinder_type_id: ct, quantity: 60, status: CylinderStatus::Filled },
                    InitEntry { cylinder_type_id: ct, quantity: 40, status: CylinderStatus::Empty },
                ],
                "seed",
            ).unwrap();
            let total = ledger.total_quantity(ct);

            for (from, to, qty) in moves {
                if from == to {
                    continue;
                }
                let _ = ledger.apply(transfer(ct, points[from], points[to], qty));

                prop_assert_eq!(ledger.total_quantity(ct), total);
                for point in &points {
                    let key = InventoryKey::from_point(ct, point);
                    prop_assert!(ledger.available_quantity(&key) >= 0);
                }
            }
        }
    }
}
