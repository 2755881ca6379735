//! Physical locations a cylinder can occupy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// Kind of place cylinders sit at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    /// Central storage.
    Yard,
    /// In-transit stock on a fleet vehicle.
    Vehicle,
    /// Stock currently held by a customer.
    Customer,
    /// Manufacturing plant.
    Plant,
    /// Refill station.
    Refilling,
}

impl LocationType {
    /// Whether this location kind is keyed by an entity reference
    /// (which vehicle, which customer).
    pub fn requires_reference(self) -> bool {
        matches!(self, LocationType::Vehicle | LocationType::Customer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LocationType::Yard => "YARD",
            LocationType::Vehicle => "VEHICLE",
            LocationType::Customer => "CUSTOMER",
            LocationType::Plant => "PLANT",
            LocationType::Refilling => "REFILLING",
        }
    }
}

impl core::fmt::Display for LocationType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for LocationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YARD" => Ok(LocationType::Yard),
            "VEHICLE" => Ok(LocationType::Vehicle),
            "CUSTOMER" => Ok(LocationType::Customer),
            "PLANT" => Ok(LocationType::Plant),
            "REFILLING" => Ok(LocationType::Refilling),
            other => Err(DomainError::validation(format!(
                "unknown location type '{other}' (expected YARD, VEHICLE, CUSTOMER, PLANT or REFILLING)"
            ))),
        }
    }
}

/// A canonical, pre-validated location.
///
/// Inventory records are only ever written against a `Location` built through
/// [`Location::new`], so the reference id is validated at ingestion time and
/// never repaired at query time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    location_type: LocationType,
    reference_id: Option<Uuid>,
}

impl Location {
    /// Build a location, enforcing the reference rule:
    /// VEHICLE and CUSTOMER require a reference id, the rest must not carry one.
    pub fn new(location_type: LocationType, reference_id: Option<Uuid>) -> DomainResult<Self> {
        match (location_type.requires_reference(), reference_id) {
            (true, None) => Err(DomainError::validation(format!(
                "{location_type} location requires a reference id"
            ))),
            (false, Some(_)) => Err(DomainError::validation(format!(
                "{location_type} location must not carry a reference id"
            ))),
            _ => Ok(Self {
                location_type,
                reference_id,
            }),
        }
    }

    pub fn yard() -> Self {
        Self {
            location_type: LocationType::Yard,
            reference_id: None,
        }
    }

    pub fn plant() -> Self {
        Self {
            location_type: LocationType::Plant,
            reference_id: None,
        }
    }

    pub fn refilling() -> Self {
        Self {
            location_type: LocationType::Refilling,
            reference_id: None,
        }
    }

    pub fn vehicle(id: crate::id::VehicleId) -> Self {
        Self {
            location_type: LocationType::Vehicle,
            reference_id: Some(*id.as_uuid()),
        }
    }

    pub fn customer(id: crate::id::CustomerId) -> Self {
        Self {
            location_type: LocationType::Customer,
            reference_id: Some(*id.as_uuid()),
        }
    }

    pub fn location_type(&self) -> LocationType {
        self.location_type
    }

    pub fn reference_id(&self) -> Option<Uuid> {
        self.reference_id
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.reference_id {
            Some(id) => write!(f, "{}:{}", self.location_type, id),
            None => write!(f, "{}", self.location_type),
        }
    }
}
