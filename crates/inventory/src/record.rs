use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gasflow_core::{CylinderStatus, CylinderTypeId, LocationType};

use crate::movement::StockPoint;

/// Identity of one inventory balance.
///
/// One record exists per key; it is created lazily on the first movement into
/// the key and never deleted (zero is a valid balance).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryKey {
    pub cylinder_type_id: CylinderTypeId,
    pub location_type: LocationType,
    pub reference_id: Option<Uuid>,
    pub status: CylinderStatus,
}

impl InventoryKey {
    pub fn from_point(cylinder_type_id: CylinderTypeId, point: &StockPoint) -> Self {
        Self {
            cylinder_type_id,
            location_type: point.location.location_type(),
            reference_id: point.location.reference_id(),
            status: point.status,
        }
    }
}

/// Current balance at a key, with the optimistic-concurrency version of the
/// record (bumped on every write).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub key: InventoryKey,
    pub quantity: i64,
    pub version: u64,
}

/// Query filters for `queryInventory`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub location_type: Option<LocationType>,
    pub reference_id: Option<Uuid>,
    pub status: Option<CylinderStatus>,
    pub cylinder_type_id: Option<CylinderTypeId>,
}

impl InventoryFilter {
    pub fn matches(&self, key: &InventoryKey) -> bool {
        if let Some(lt) = self.location_type {
            if key.location_type != lt {
                return false;
            }
        }
        if let Some(reference) = self.reference_id {
            if key.reference_id != Some(reference) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if key.status != status {
                return false;
            }
        }
        if let Some(ct) = self.cylinder_type_id {
            if key.cylinder_type_id != ct {
                return false;
            }
        }
        true
    }
}

/// Aggregate total per (location type, status), for the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub location_type: LocationType,
    pub status: CylinderStatus,
    pub total_quantity: i64,
}
