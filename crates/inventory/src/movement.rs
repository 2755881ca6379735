use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gasflow_core::{
    CylinderStatus, CylinderTypeId, DomainError, DomainResult, Location, MovementId,
};

/// Business meaning of a quantity transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    DeliveryFilled,
    DeliveryEmpty,
    ReturnFilled,
    ReturnEmpty,
    RefillingIn,
    RefillingOut,
    Conversion,
    Transfer,
    Adjustment,
    Initialization,
}

impl MovementType {
    /// Movement kinds that inject quantity from outside the tracked system
    /// and are therefore exempt from the conservation invariant.
    pub fn allows_external_source(self) -> bool {
        matches!(self, MovementType::Initialization | MovementType::Adjustment)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::DeliveryFilled => "DELIVERY_FILLED",
            MovementType::DeliveryEmpty => "DELIVERY_EMPTY",
            MovementType::ReturnFilled => "RETURN_FILLED",
            MovementType::ReturnEmpty => "RETURN_EMPTY",
            MovementType::RefillingIn => "REFILLING_IN",
            MovementType::RefillingOut => "REFILLING_OUT",
            MovementType::Conversion => "CONVERSION",
            MovementType::Transfer => "TRANSFER",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Initialization => "INITIALIZATION",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DELIVERY_FILLED" => Ok(MovementType::DeliveryFilled),
            "DELIVERY_EMPTY" => Ok(MovementType::DeliveryEmpty),
            "RETURN_FILLED" => Ok(MovementType::ReturnFilled),
            "RETURN_EMPTY" => Ok(MovementType::ReturnEmpty),
            "REFILLING_IN" => Ok(MovementType::RefillingIn),
            "REFILLING_OUT" => Ok(MovementType::RefillingOut),
            "CONVERSION" => Ok(MovementType::Conversion),
            "TRANSFER" => Ok(MovementType::Transfer),
            "ADJUSTMENT" => Ok(MovementType::Adjustment),
            "INITIALIZATION" => Ok(MovementType::Initialization),
            other => Err(DomainError::validation(format!(
                "unknown movement type '{other}'"
            ))),
        }
    }
}

/// One endpoint of a movement: a location plus the fill status the quantity
/// is counted under there.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockPoint {
    pub location: Location,
    pub status: CylinderStatus,
}

impl StockPoint {
    pub fn new(location: Location, status: CylinderStatus) -> Self {
        Self { location, status }
    }
}

impl core::fmt::Display for StockPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.location, self.status)
    }
}

/// A movement as submitted by a caller, before the ledger records it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub cylinder_type_id: CylinderTypeId,
    /// `None` means the quantity enters from outside the tracked system;
    /// only INITIALIZATION and ADJUSTMENT may do that.
    pub source: Option<StockPoint>,
    pub destination: StockPoint,
    pub quantity: i64,
    pub movement_type: MovementType,
    /// Links to the business event (e.g. an exchange) this movement belongs to.
    pub reference_transaction_id: Option<Uuid>,
    pub actor: String,
    pub notes: Option<String>,
}

impl MovementRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("movement quantity must be positive"));
        }
        match (&self.source, self.movement_type.allows_external_source()) {
            (None, false) => Err(DomainError::validation(format!(
                "{} movement requires a source; only INITIALIZATION and ADJUSTMENT enter stock externally",
                self.movement_type
            ))),
            (Some(_), _) if self.movement_type == MovementType::Initialization => Err(
                DomainError::validation("INITIALIZATION must not carry a source"),
            ),
            _ => Ok(()),
        }
    }
}

/// A recorded, immutable ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub cylinder_type_id: CylinderTypeId,
    pub source: Option<StockPoint>,
    pub destination: StockPoint,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reference_transaction_id: Option<Uuid>,
    pub actor: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Filters for reading back the movement log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub cylinder_type_id: Option<CylinderTypeId>,
    pub movement_type: Option<MovementType>,
    pub reference_transaction_id: Option<Uuid>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        if let Some(ct) = self.cylinder_type_id {
            if movement.cylinder_type_id != ct {
                return false;
            }
        }
        if let Some(mt) = self.movement_type {
            if movement.movement_type != mt {
                return false;
            }
        }
        if let Some(reference) = self.reference_transaction_id {
            if movement.reference_transaction_id != Some(reference) {
                return false;
            }
        }
        true
    }
}
