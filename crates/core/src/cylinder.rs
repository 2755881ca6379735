//! Cylinder fill status.

use serde::{Deserialize, Serialize};

/// Whether a cylinder currently counts as filled or empty.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CylinderStatus {
    Filled,
    Empty,
}

impl CylinderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CylinderStatus::Filled => "FILLED",
            CylinderStatus::Empty => "EMPTY",
        }
    }
}

impl core::fmt::Display for CylinderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CylinderStatus {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FILLED" => Ok(CylinderStatus::Filled),
            "EMPTY" => Ok(CylinderStatus::Empty),
            other => Err(crate::error::DomainError::validation(format!(
                "unknown cylinder status '{other}' (expected FILLED or EMPTY)"
            ))),
        }
    }
}
